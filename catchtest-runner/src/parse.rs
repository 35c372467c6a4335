// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpreting the XML reports produced by Catch test binaries.
//!
//! A test binary run with `--reporter xml` produces a document of roughly this shape (other
//! elements and attributes are ignored):
//!
//! ```xml
//! <Catch name="tests">
//!   <Group name="tests">
//!     <TestCase name="Factorials are computed" filename="factorial.cpp" line="10">
//!       <Expression success="false" type="REQUIRE" filename="factorial.cpp" line="12">
//!         <Original>Factorial(0) == 1</Original>
//!         <Expanded>0 == 1</Expanded>
//!       </Expression>
//!       <OverallResult success="false"/>
//!     </TestCase>
//!   </Group>
//! </Catch>
//! ```
//!
//! [`Document::parse`] turns the text into an element tree, and the functions in this module
//! query that tree.

use crate::errors::ResultParseError;
use camino::Utf8PathBuf;
use catchtest_metadata::{FailureLocationSummary, OutcomeSummary};
use quick_xml::events::{BytesStart, Event};
use std::fmt;

const TEST_CASE: &str = "TestCase";
const OVERALL_RESULT: &str = "OverallResult";
const EXPRESSION: &str = "Expression";

/// A parsed XML document: the elements at the top level, with their attributes and children.
///
/// Text content is not retained.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    roots: Vec<Element>,
}

impl Document {
    /// Parses an XML document.
    pub fn parse(xml: &str) -> Result<Self, ResultParseError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut roots = Vec::new();
        // The chain of currently open elements, outermost first.
        let mut open: Vec<Element> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|error| ResultParseError::Malformed { error })?;
            match event {
                Event::Start(start) => {
                    open.push(Element::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut open, &mut roots, element);
                }
                Event::End(_) => {
                    // The reader checks that end tags match, so an unmatched end tag never gets
                    // here.
                    if let Some(element) = open.pop() {
                        attach(&mut open, &mut roots, element);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = open.pop() {
            return Err(ResultParseError::Truncated {
                element: element.name,
            });
        }
        if roots.is_empty() {
            return Err(ResultParseError::Empty);
        }

        Ok(Self { roots })
    }

    /// Returns the top-level elements.
    pub fn roots(&self) -> &[Element] {
        &self.roots
    }

    /// Iterates over every element in the document, in document order.
    pub fn elements(&self) -> Descendants<'_> {
        Descendants::new(&self.roots)
    }
}

fn attach(open: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// An element in a [`Document`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ResultParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(|error| ResultParseError::Malformed {
                    error: error.into(),
                })?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map_err(|error| ResultParseError::Malformed { error })?;
                Ok((key, value.into_owned()))
            })
            .collect::<Result<_, ResultParseError>>()?;

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Returns the tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unescaped value of an attribute, or `None` if it isn't present.
    ///
    /// If an attribute is repeated, the first value wins.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the direct children of this element.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Iterates over all elements nested within this one, in document order.
    ///
    /// The element itself is not included.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(&self.children)
    }

    fn required_attribute(&self, key: &'static str) -> Result<&str, ResultParseError> {
        self.attribute(key)
            .ok_or_else(|| ResultParseError::MissingAttribute {
                element: self.name.clone(),
                attribute: key,
            })
    }
}

/// A pre-order iterator over elements.
///
/// Returned by [`Document::elements`] and [`Element::descendants`].
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    // Elements still to be visited, in reverse order.
    stack: Vec<&'a Element>,
}

impl<'a> Descendants<'a> {
    fn new(elements: &'a [Element]) -> Self {
        Self {
            stack: elements.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// The outcome of a single test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TestOutcome {
    /// The test case passed.
    Passed,

    /// The test case failed.
    Failed,

    /// The outcome could not be determined.
    Unknown,
}

impl TestOutcome {
    /// Returns a short lowercase description of the outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed => "failed",
            TestOutcome::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TestOutcome> for OutcomeSummary {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Passed => OutcomeSummary::Passed,
            TestOutcome::Failed => OutcomeSummary::Failed,
            TestOutcome::Unknown => OutcomeSummary::Unknown,
        }
    }
}

/// The source location of a failing assertion.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FailureLocation {
    /// The source file, as reported by the test binary.
    pub file: Utf8PathBuf,

    /// The 1-based line number.
    pub line: u32,
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl From<FailureLocation> for FailureLocationSummary {
    fn from(location: FailureLocation) -> Self {
        FailureLocationSummary {
            file: location.file,
            line: location.line,
        }
    }
}

/// The interpreted result of a single test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedResult {
    /// The outcome.
    pub outcome: TestOutcome,

    /// A human-readable error message, if one is available.
    pub error_message: Option<String>,

    /// Where the test case failed, if known.
    pub failure_location: Option<FailureLocation>,
}

impl ParsedResult {
    /// Creates a result with the given outcome and no diagnostics.
    pub fn new(outcome: TestOutcome) -> Self {
        Self {
            outcome,
            error_message: None,
            failure_location: None,
        }
    }
}

/// Finds the `TestCase` element named `name`.
///
/// If several elements match, the first one in document order is returned.
pub fn locate<'a>(document: &'a Document, name: &str) -> Result<&'a Element, ResultParseError> {
    document
        .elements()
        .find(|element| element.name == TEST_CASE && element.attribute("name") == Some(name))
        .ok_or_else(|| ResultParseError::TestCaseNotFound {
            name: name.to_owned(),
        })
}

/// Determines the outcome of a test case from its first nested `OverallResult` element.
///
/// A missing `OverallResult` means the outcome is unknown. Otherwise the test case passed if the
/// `success` attribute is `true` in any case, and failed for any other value, including a missing
/// attribute.
pub fn classify(test_case: &Element) -> TestOutcome {
    let Some(overall) = test_case
        .descendants()
        .find(|element| element.name == OVERALL_RESULT)
    else {
        return TestOutcome::Unknown;
    };

    match overall.attribute("success") {
        Some(success) if success.eq_ignore_ascii_case("true") => TestOutcome::Passed,
        _ => TestOutcome::Failed,
    }
}

/// Returns the location of the first failing `Expression` within a test case.
///
/// An expression is failing if its `success` attribute is exactly `false`. Only the first one in
/// document order is considered, even if a later one is more relevant.
pub fn locate_failure(test_case: &Element) -> Result<FailureLocation, ResultParseError> {
    let expression = test_case
        .descendants()
        .find(|element| element.name == EXPRESSION && element.attribute("success") == Some("false"))
        .ok_or(ResultParseError::NoFailureExpressionFound)?;

    let file = expression.required_attribute("filename")?;
    let line = expression.required_attribute("line")?;
    let line = line
        .trim()
        .parse()
        .map_err(|error| ResultParseError::InvalidLine {
            value: line.to_owned(),
            error,
        })?;

    Ok(FailureLocation {
        file: file.into(),
        line,
    })
}

/// Returns the error message for a failed test case.
///
/// Catch does not produce a single message per test case, and no policy for assembling one out of
/// the individual expressions exists yet, so this always returns an empty string.
pub fn extract_error_message(_test_case: &Element) -> String {
    String::new()
}
