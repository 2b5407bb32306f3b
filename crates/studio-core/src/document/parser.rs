use super::{Entry, ParameterDocument, SectionKind};
use crate::domain::{CoreResult, StudioError};
use std::collections::HashSet;

const MARKER: &str = "**";
const COMMENT_DELIMITER: char = '*';
const ASSIGNMENT_DELIMITER: char = '=';

pub(super) fn parse(source: &str) -> CoreResult<ParameterDocument> {
    let mut document = ParameterDocument::empty();
    let mut active = SectionKind::Description;
    let mut seen_names: HashSet<String> = HashSet::new();

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;

        if raw.starts_with(MARKER) {
            // Marker line: either a section header or a free comment that
            // belongs to the currently active section.
            if let Some(kind) = section_for_header(raw) {
                active = kind;
            } else {
                document
                    .section_mut(active)
                    .entries
                    .push(Entry::Comment {
                        text: raw[MARKER.len()..].trim().to_string(),
                    });
            }
            continue;
        }

        if raw.trim().is_empty() {
            continue;
        }

        let Some((head, tail)) = raw.split_once(COMMENT_DELIMITER) else {
            return Err(StudioError::parse(
                "PARSE.COMMENT_DELIMITER",
                format!(
                    "line {}: data line without a '*' description delimiter: '{}'",
                    line_number,
                    raw.trim_end()
                ),
            ));
        };

        match head.split_once(ASSIGNMENT_DELIMITER) {
            Some((name, value)) => {
                let name = name.trim().to_string();
                if !seen_names.insert(name.clone()) {
                    return Err(StudioError::parse(
                        "PARSE.DUPLICATE_PARAMETER",
                        format!(
                            "line {}: parameter '{}' is defined more than once",
                            line_number, name
                        ),
                    ));
                }
                document.section_mut(active).entries.push(Entry::Parameter {
                    name,
                    value: value.trim().to_string(),
                    description: tail.trim().to_string(),
                });
            }
            None => {
                // Continuation of the previous parameter's description.
                let Some(Entry::Parameter { description, .. }) =
                    document.section_mut(active).entries.last_mut()
                else {
                    return Err(StudioError::parse(
                        "PARSE.CONTINUATION",
                        format!(
                            "line {}: description continuation without a preceding parameter: '{}'",
                            line_number,
                            raw.trim_end()
                        ),
                    ));
                };
                description.push(COMMENT_DELIMITER);
                description.push_str(tail.trim());
            }
        }
    }

    Ok(document)
}

fn section_for_header(line: &str) -> Option<SectionKind> {
    SectionKind::ALL.iter().copied().find(|kind| {
        kind.header_prefix()
            .is_some_and(|prefix| line.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::document::{Entry, SectionKind};
    use crate::domain::StudioErrorCategory;

    const SAMPLE: &str = "\
** SimSS device parameters
** version: 4.33

**General****************************************************************************
T = 295                   * K, absolute temperature
L = 300e-9                * m, device thickness
eps_r = 4.0               * relative dielectric constant

**Mobilities*************************************************************************
mun_0 = 1e-7              * m^2/Vs, zero field mobility of electrons
mup_0 = 1e-7              * m^2/Vs, zero field mobility of holes
mob_n_dep = 0             * 0 : const. mob, 1 : field-dependent
                          * 2 : extended Gaussian disorder model
";

    #[test]
    fn header_lines_switch_sections_without_producing_entries() {
        let document = parse(SAMPLE).expect("sample should parse");

        let description = document.section(SectionKind::Description);
        assert_eq!(description.entries.len(), 2);
        assert_eq!(
            description.entries[0],
            Entry::Comment {
                text: "SimSS device parameters".to_string()
            }
        );

        let general = document.section(SectionKind::General);
        assert_eq!(general.entries.len(), 3);
        assert_eq!(
            general.entries[1],
            Entry::Parameter {
                name: "L".to_string(),
                value: "300e-9".to_string(),
                description: "m, device thickness".to_string(),
            }
        );
    }

    #[test]
    fn continuation_lines_extend_the_previous_description() {
        let document = parse(SAMPLE).expect("sample should parse");
        let mobilities = document.section(SectionKind::Mobilities);
        assert_eq!(
            mobilities.entries[2],
            Entry::Parameter {
                name: "mob_n_dep".to_string(),
                value: "0".to_string(),
                description: "0 : const. mob, 1 : field-dependent*2 : extended Gaussian disorder model"
                    .to_string(),
            }
        );
    }

    #[test]
    fn unmatched_marker_line_becomes_a_section_comment() {
        let source = "\
**General****************************************************************************
T = 295                   * K, absolute temperature
** thermal parameters end here
";
        let document = parse(source).expect("source should parse");
        let general = document.section(SectionKind::General);
        assert_eq!(
            general.entries[1],
            Entry::Comment {
                text: "thermal parameters end here".to_string()
            }
        );
    }

    #[test]
    fn orphan_continuation_is_a_parse_error_with_line_context() {
        let source = "\
**General****************************************************************************
                          * stray continuation line
";
        let error = parse(source).expect_err("orphan continuation should fail");
        assert_eq!(error.category(), StudioErrorCategory::Parse);
        assert_eq!(error.code(), "PARSE.CONTINUATION");
        assert!(error.message().contains("line 2"));
        assert!(error.message().contains("stray continuation line"));
    }

    #[test]
    fn data_line_without_comment_delimiter_is_rejected() {
        let source = "\
**General****************************************************************************
T = 295
";
        let error = parse(source).expect_err("missing delimiter should fail");
        assert_eq!(error.code(), "PARSE.COMMENT_DELIMITER");
        assert!(error.message().contains("line 2"));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected_across_sections() {
        let source = "\
**General****************************************************************************
L = 300e-9                * m, device thickness

**Mobilities*************************************************************************
L = 100e-9                * duplicate of the General entry
";
        let error = parse(source).expect_err("duplicate name should fail");
        assert_eq!(error.code(), "PARSE.DUPLICATE_PARAMETER");
        assert!(error.message().contains("'L'"));
        assert!(error.message().contains("line 5"));
    }

    #[test]
    fn blank_lines_are_skipped_entirely() {
        let document = parse("\n\n   \n").expect("blank input should parse");
        assert!(document.sections().iter().all(|s| s.entries.is_empty()));
    }
}
