//! Schematic energy-band diagram inputs.
//!
//! Builds a plain data model from a fixed whitelist of device parameters;
//! the actual rendering is done by the plotting layer.

use crate::document::ParameterDocument;
use crate::domain::{CoreResult, StudioError};
use serde::Serialize;

pub const BAND_DIAGRAM_PARAMETERS: [&str; 11] = [
    "L", "L_LTL", "L_RTL", "CB", "VB", "W_L", "W_R", "CB_LTL", "CB_RTL", "VB_LTL", "VB_RTL",
];

/// Fraction of the device width below which a transport layer is widened so
/// it stays visible in the schematic.
const MIN_VISUAL_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandLayer {
    pub x_left: f64,
    pub x_right: f64,
    /// Conduction-band energy, eV (negative: below vacuum).
    pub conduction: f64,
    /// Valence-band energy, eV.
    pub valence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Electrode {
    pub x_left: f64,
    pub x_right: f64,
    /// Work function, eV.
    pub work_function: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandDiagram {
    /// Device width as drawn, m.
    pub device_width: f64,
    pub left_transport: Option<BandLayer>,
    pub absorber: BandLayer,
    pub right_transport: Option<BandLayer>,
    pub left_electrode: Electrode,
    pub right_electrode: Electrode,
    /// True layer widths (L, L_LTL, L_RTL) before visual scaling, for the
    /// width bar beneath the diagram.
    pub true_widths: [f64; 3],
    /// Lowest band or electrode energy, eV; the width bar hangs below it.
    pub energy_floor: f64,
}

/// Extracts the whitelist parameters and builds the schematic. Fails with a
/// geometry error when the transport layers do not fit inside the device,
/// before any layer is laid out.
pub fn build_band_diagram(document: &ParameterDocument) -> CoreResult<BandDiagram> {
    // Presence of the whole whitelist first, then typed reads.
    document.collect_named(&BAND_DIAGRAM_PARAMETERS)?;

    let l = document.float_value("L")?;
    let l_ltl = document.float_value("L_LTL")?;
    let l_rtl = document.float_value("L_RTL")?;
    let cb = -document.float_value("CB")?;
    let vb = -document.float_value("VB")?;
    let w_l = -document.float_value("W_L")?;
    let w_r = -document.float_value("W_R")?;
    let cb_ltl = -document.float_value("CB_LTL")?;
    let cb_rtl = -document.float_value("CB_RTL")?;
    let vb_ltl = -document.float_value("VB_LTL")?;
    let vb_rtl = -document.float_value("VB_RTL")?;

    if l - l_ltl - l_rtl <= 0.0 {
        return Err(StudioError::geometry(
            "GEOM.TRANSPORT_WIDTHS",
            format!(
                "transport layers (L_LTL {} + L_RTL {}) do not fit inside the device width (L {})",
                l_ltl, l_rtl, l
            ),
        ));
    }

    let true_widths = [l, l_ltl, l_rtl];
    let (l_ltl, l_rtl) = visually_scaled_widths(l, l_ltl, l_rtl);

    let energy_floor = [cb, vb, w_l, w_r, cb_ltl, cb_rtl, vb_ltl, vb_rtl]
        .into_iter()
        .fold(f64::INFINITY, f64::min);

    let left_transport = (l_ltl > 0.0).then_some(BandLayer {
        x_left: 0.0,
        x_right: l_ltl,
        conduction: cb_ltl,
        valence: vb_ltl,
    });
    let absorber = BandLayer {
        x_left: l_ltl,
        x_right: l - l_rtl,
        conduction: cb,
        valence: vb,
    };
    let right_transport = (l_rtl > 0.0).then_some(BandLayer {
        x_left: l - l_rtl,
        x_right: l,
        conduction: cb_rtl,
        valence: vb_rtl,
    });

    Ok(BandDiagram {
        device_width: l,
        left_transport,
        absorber,
        right_transport,
        left_electrode: Electrode {
            x_left: -MIN_VISUAL_FRACTION * l,
            x_right: 0.0,
            work_function: w_l,
        },
        right_electrode: Electrode {
            x_left: l,
            x_right: l + MIN_VISUAL_FRACTION * l,
            work_function: w_r,
        },
        true_widths,
        energy_floor,
    })
}

/// Thin transport layers are widened to a tenth of the device so they stay
/// visible; the absorber gives up the difference proportionally.
fn visually_scaled_widths(l: f64, mut l_ltl: f64, mut l_rtl: f64) -> (f64, f64) {
    if l_ltl == 0.0 || l_rtl == 0.0 {
        return (l_ltl, l_rtl);
    }
    let minimum = MIN_VISUAL_FRACTION * l;
    if l_ltl < minimum {
        l_ltl = minimum;
    }
    if l_rtl < minimum {
        l_rtl = minimum;
    }
    if l - l_ltl - l_rtl < minimum {
        let fraction = l_ltl / l_rtl;
        let deficit = minimum - (l - l_ltl - l_rtl);
        l_ltl -= deficit * fraction;
        l_rtl -= deficit / fraction;
    }
    (l_ltl, l_rtl)
}

#[cfg(test)]
mod tests {
    use super::{BAND_DIAGRAM_PARAMETERS, build_band_diagram, visually_scaled_widths};
    use crate::document::{Entry, ParameterDocument, SectionKind};
    use crate::domain::StudioErrorCategory;

    fn document_with(values: &[(&str, &str)]) -> ParameterDocument {
        let mut document = ParameterDocument::empty();
        let section = document.section_mut(SectionKind::TransportLayers);
        for (name, value) in values {
            section.entries.push(Entry::Parameter {
                name: (*name).to_string(),
                value: (*value).to_string(),
                description: String::new(),
            });
        }
        document
    }

    fn solar_cell_values() -> Vec<(&'static str, &'static str)> {
        vec![
            ("L", "300e-9"),
            ("L_LTL", "30e-9"),
            ("L_RTL", "30e-9"),
            ("CB", "3.0"),
            ("VB", "5.0"),
            ("W_L", "4.05"),
            ("W_R", "4.95"),
            ("CB_LTL", "3.0"),
            ("CB_RTL", "2.5"),
            ("VB_LTL", "5.5"),
            ("VB_RTL", "5.0"),
        ]
    }

    #[test]
    fn diagram_lays_out_three_layers_and_two_electrodes() {
        let document = document_with(&solar_cell_values());
        let diagram = build_band_diagram(&document).expect("diagram should build");

        assert_eq!(diagram.device_width, 300e-9);
        let left = diagram.left_transport.expect("left transport layer");
        let right = diagram.right_transport.expect("right transport layer");
        assert_eq!(left.x_left, 0.0);
        assert_eq!(left.conduction, -3.0);
        assert_eq!(right.valence, -5.0);
        assert_eq!(diagram.absorber.x_left, left.x_right);
        assert_eq!(diagram.left_electrode.work_function, -4.05);
        assert_eq!(diagram.energy_floor, -5.5);
        assert_eq!(diagram.true_widths, [300e-9, 30e-9, 30e-9]);
    }

    #[test]
    fn oversized_transport_layers_raise_a_geometry_error() {
        let mut values = solar_cell_values();
        values[0] = ("L", "100");
        values[1] = ("L_LTL", "60");
        values[2] = ("L_RTL", "50");
        let document = document_with(&values);

        let error = build_band_diagram(&document).expect_err("geometry guard should fire");
        assert_eq!(error.category(), StudioErrorCategory::Geometry);
        assert_eq!(error.code(), "GEOM.TRANSPORT_WIDTHS");
    }

    #[test]
    fn missing_whitelist_parameter_is_a_not_found_error() {
        let mut values = solar_cell_values();
        values.retain(|(name, _)| *name != "CB_RTL");
        let document = document_with(&values);

        let error = build_band_diagram(&document).expect_err("missing parameter should fail");
        assert_eq!(error.category(), StudioErrorCategory::NotFound);
        assert!(error.message().contains("CB_RTL"));
    }

    #[test]
    fn whitelist_covers_all_eleven_parameters() {
        assert_eq!(BAND_DIAGRAM_PARAMETERS.len(), 11);
    }

    #[test]
    fn thin_transport_layers_are_widened_for_visibility() {
        let (l_ltl, l_rtl) = visually_scaled_widths(300.0, 10.0, 40.0);
        assert_eq!(l_ltl, 30.0);
        assert_eq!(l_rtl, 40.0);

        // Zero-width layers stay untouched; no widening without both layers.
        assert_eq!(visually_scaled_widths(300.0, 0.0, 40.0), (0.0, 40.0));
    }

    #[test]
    fn squeezed_absorber_reclaims_width_proportionally() {
        let (l_ltl, l_rtl) = visually_scaled_widths(100.0, 50.0, 45.0);
        let absorber = 100.0 - l_ltl - l_rtl;
        assert!(absorber >= 10.0 - 1.0e-9);
    }
}
