//! KiCad board file (.kicad_pcb) footprint extraction.
//!
//! Handles both the current `(footprint ... (property "Value" "..."))` layout
//! and the KiCad 5 `(module ... (fp_text value ...))` layout.

use crate::{Sexpr, Span};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("KiCad PCB root is not a list")]
    NotAList,
    #[error("expected a (kicad_pcb ...) root, found ({0} ...)")]
    UnexpectedRoot(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintAt {
    pub x: f64,
    pub y: f64,
    pub rot: Option<f64>,
}

impl FootprintAt {
    /// Render as an `(at X Y [ROT])` list, omitting a zero or absent rotation
    /// like KiCad does.
    pub fn to_sexpr_text(&self) -> String {
        match self.rot {
            Some(rot) if rot != 0.0 => format!(
                "(at {} {} {})",
                format_number(self.x),
                format_number(self.y),
                format_number(rot)
            ),
            _ => format!("(at {} {})", format_number(self.x), format_number(self.y)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardFootprint {
    pub reference: Option<String>,
    pub value: Option<String>,
    pub at: Option<FootprintAt>,
    /// Span of the footprint's own `(at ...)` list, if it has one.
    pub at_span: Option<Span>,
    /// Where an `(at ...)` list goes when the footprint has none.
    pub insert_offset: usize,
}

const FOOTPRINT_TAGS: [&str; 2] = ["footprint", "module"];

/// Every top-level footprint of a board, in file order.
pub fn extract_footprints(root: &Sexpr) -> Result<Vec<BoardFootprint>, ExtractError> {
    let items = root.as_list().ok_or(ExtractError::NotAList)?;
    match root.tag() {
        Some("kicad_pcb") => {}
        other => return Err(ExtractError::UnexpectedRoot(other.unwrap_or("").to_string())),
    }

    let footprints: Vec<BoardFootprint> = items
        .iter()
        .skip(1)
        .filter(|node| node.tag().is_some_and(|tag| FOOTPRINT_TAGS.contains(&tag)))
        .map(footprint_from_node)
        .collect();

    log::debug!("Extracted {} footprints from board", footprints.len());
    Ok(footprints)
}

fn footprint_from_node(node: &Sexpr) -> BoardFootprint {
    let items = node.as_list().unwrap_or_default();

    // After `(footprint "<FPID>"`, or after the tag when the id is missing.
    let insert_offset = items
        .get(1)
        .filter(|n| n.as_text().is_some())
        .or_else(|| items.first())
        .map_or(node.span.start + 1, |n| n.span.end);

    let mut properties: BTreeMap<&str, &str> = BTreeMap::new();
    let mut fp_text: BTreeMap<&str, &str> = BTreeMap::new();
    let mut at = None;
    let mut at_span = None;

    for child in items.iter().skip(1) {
        let Some(list) = child.as_list() else {
            continue;
        };
        match child.tag() {
            Some("property") => {
                if let (Some(name), Some(value)) = (
                    list.get(1).and_then(Sexpr::as_text),
                    list.get(2).and_then(Sexpr::as_text),
                ) {
                    properties.insert(name, value);
                }
            }
            Some("fp_text") => {
                if let (Some(kind), Some(text)) = (
                    list.get(1).and_then(Sexpr::as_sym),
                    list.get(2).and_then(Sexpr::as_text),
                ) {
                    fp_text.entry(kind).or_insert(text);
                }
            }
            Some("at") if at_span.is_none() => {
                at = parse_at(list);
                at_span = Some(child.span);
            }
            _ => {}
        }
    }

    let text_field = |property: &str, kind: &str| {
        properties
            .get(property)
            .or_else(|| fp_text.get(kind))
            .map(|text| text.to_string())
    };

    BoardFootprint {
        reference: text_field("Reference", "reference"),
        value: text_field("Value", "value"),
        at,
        at_span,
        insert_offset,
    }
}

fn parse_at(list: &[Sexpr]) -> Option<FootprintAt> {
    let x = list.get(1)?.as_number()?;
    let y = list.get(2)?.as_number()?;
    let rot = list.get(3).and_then(Sexpr::as_number);
    Some(FootprintAt { x, y, rot })
}

/// Format a millimeter value the way KiCad writes it: at most six decimals,
/// trailing zeros dropped, no negative zero.
pub fn format_number(value: f64) -> String {
    let mut text = format!("{value:.6}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}
