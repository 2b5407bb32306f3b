//! Structured representation of the SimSS device-parameter text file.
//!
//! The file is an ordered set of fixed, named sections holding comment and
//! `name = value` entries. Values stay untyped text at the document level;
//! numeric interpretation happens through the typed accessors at the point
//! of consumption.

mod parser;
mod writer;

use crate::domain::{CoreResult, StudioError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Description,
    General,
    Mobilities,
    Contacts,
    TransportLayers,
    Ions,
    GenerationRecombination,
    Trapping,
    NumericalParameters,
    VoltageRange,
    UserInterface,
}

impl SectionKind {
    pub const ALL: [SectionKind; 11] = [
        Self::Description,
        Self::General,
        Self::Mobilities,
        Self::Contacts,
        Self::TransportLayers,
        Self::Ions,
        Self::GenerationRecombination,
        Self::Trapping,
        Self::NumericalParameters,
        Self::VoltageRange,
        Self::UserInterface,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Description => "Description",
            Self::General => "General",
            Self::Mobilities => "Mobilities",
            Self::Contacts => "Contacts",
            Self::TransportLayers => "Transport layers",
            Self::Ions => "Ions",
            Self::GenerationRecombination => "Generation and recombination",
            Self::Trapping => "Trapping",
            Self::NumericalParameters => "Numerical Parameters",
            Self::VoltageRange => "Voltage range of simulation",
            Self::UserInterface => "User interface",
        }
    }

    /// Literal prefix a marker line must start with to open this section.
    /// The Description block has no header; it collects everything before
    /// the first matched header.
    pub const fn header_prefix(self) -> Option<&'static str> {
        match self {
            Self::Description => None,
            Self::General => Some("**General*****"),
            Self::Mobilities => Some("**Mobilities*****"),
            Self::Contacts => Some("**Contacts*****"),
            Self::TransportLayers => Some("**Transport layers*****"),
            Self::Ions => Some("**Ions*****"),
            Self::GenerationRecombination => Some("**Generation and recombination*****"),
            Self::Trapping => Some("**Trapping*****"),
            Self::NumericalParameters => Some("**Numerical Parameters*****"),
            Self::VoltageRange => Some("**Voltage range of simulation*****"),
            Self::UserInterface => Some("**User interface*****"),
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .expect("SectionKind::ALL covers every variant")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Comment {
        text: String,
    },
    /// `description` may hold several `*`-joined segments; each segment is
    /// rendered as its own comment line on serialization.
    Parameter {
        name: String,
        value: String,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
}

impl Section {
    fn empty(kind: SectionKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }
}

/// The whole parameter file. Always carries all eleven section containers in
/// fixed order, even when empty, so positional expectations of callers stay
/// valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDocument {
    sections: Vec<Section>,
}

impl ParameterDocument {
    pub fn empty() -> Self {
        Self {
            sections: SectionKind::ALL.iter().copied().map(Section::empty).collect(),
        }
    }

    pub fn parse(source: &str) -> CoreResult<Self> {
        parser::parse(source)
    }

    pub fn to_text(&self) -> String {
        writer::to_text(self)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        &self.sections[kind.index()]
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.sections[kind.index()]
    }

    /// Iterates every parameter entry in document order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.sections.iter().flat_map(|section| {
            section.entries.iter().filter_map(|entry| match entry {
                Entry::Parameter {
                    name,
                    value,
                    description,
                } => Some((name.as_str(), value.as_str(), description.as_str())),
                Entry::Comment { .. } => None,
            })
        })
    }

    pub fn value(&self, name: &str) -> CoreResult<&str> {
        self.parameters()
            .find(|(candidate, _, _)| *candidate == name)
            .map(|(_, value, _)| value)
            .ok_or_else(|| parameter_not_found(name))
    }

    pub fn set_value(&mut self, name: &str, new_value: impl Into<String>) -> CoreResult<()> {
        let slot = self
            .sections
            .iter_mut()
            .flat_map(|section| section.entries.iter_mut())
            .find_map(|entry| match entry {
                Entry::Parameter {
                    name: candidate,
                    value,
                    ..
                } if candidate.as_str() == name => Some(value),
                _ => None,
            });
        match slot {
            Some(value) => {
                *value = new_value.into();
                Ok(())
            }
            None => Err(parameter_not_found(name)),
        }
    }

    /// Bulk extraction of a fixed whitelist of parameter names into a flat
    /// mapping. Fails on the first missing name.
    pub fn collect_named(&self, names: &[&str]) -> CoreResult<BTreeMap<String, String>> {
        let mut collected = BTreeMap::new();
        for name in names {
            let value = self.value(name)?;
            collected.insert((*name).to_string(), value.to_string());
        }
        Ok(collected)
    }

    /// Typed accessor for consumption sites that need a numeric value.
    pub fn float_value(&self, name: &str) -> CoreResult<f64> {
        let raw = self.value(name)?;
        parse_float(name, raw)
    }
}

pub(crate) fn parse_float(name: &str, raw: &str) -> CoreResult<f64> {
    let normalized = raw.trim().replace(['D', 'd'], "E");
    normalized.parse::<f64>().map_err(|_| {
        StudioError::parse(
            "PARSE.NUMERIC_VALUE",
            format!("parameter '{}' holds non-numeric value '{}'", name, raw),
        )
    })
}

fn parameter_not_found(name: &str) -> StudioError {
    StudioError::not_found(
        "DOC.PARAMETER",
        format!("parameter '{}' is not defined in the device parameter file", name),
    )
}
