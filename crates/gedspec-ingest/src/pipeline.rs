//! The extraction pipeline.
//!
//! Passes run in dependency order: prefixes and datatypes first, then the
//! grammar rules and the hierarchy they feed, then the prose passes that
//! merge descriptions onto the graph, and finally cross-source validation.
//! Any error aborts the run before anything is emitted.

use gedspec_dsl::{HierarchyBuilder, Topology};

use crate::calendars;
use crate::datatypes;
use crate::document::{collect_rule_productions, SpecDocument};
use crate::enums;
use crate::error::ExtractError;
use crate::graph::{registry_tag, Definition, EntryKind, SchemaGraph};
use crate::options::ExtractOptions;
use crate::prefixes::PrefixTable;
use crate::report::RunReport;
use crate::sections;
use crate::tables::{self, Tagsets};

/// Everything one run produces short of rendered output.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub graph: SchemaGraph,
    pub topology: Topology,
    pub prefixes: PrefixTable,
    pub report: RunReport,
}

pub fn extract(
    document: &SpecDocument,
    source: &str,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    let mut report = RunReport::new(source, document.text());

    let prefixes = PrefixTable::scan(document);
    report.counts.prefixes = prefixes.len();

    let datatype_scan = datatypes::scan(document);
    report.counts.datatypes = datatype_scan.table.len();

    let rule_sections = document.rule_sections();
    let rule_set = collect_rule_productions(&rule_sections)?;
    report.counts.rules = rule_set.len();
    let rules = rule_set.resolve()?;

    let blocks = document.gedstruct_blocks();
    report.counts.gedstruct_blocks = blocks.len();
    let mut builder = HierarchyBuilder::new(&rules, &datatype_scan.table);
    for block in &blocks {
        builder.apply_block(block)?;
    }
    let topology = builder.finish();
    report.counts.hierarchy_identifiers = topology.len();
    tracing::debug!(
        identifiers = topology.len(),
        blocks = blocks.len(),
        "hierarchy assembled"
    );

    let mut graph = SchemaGraph::new();
    for fact in datatype_scan.facts {
        graph.record(&fact.tag, Definition::Datatype, vec![fact.description])?;
    }

    let section_scan = sections::scan(document);
    report.counts.structure_sections = section_scan.structures.len();
    for section in section_scan.structures {
        let Some(entry) = topology.get(&section.id) else {
            return Err(ExtractError::MissingHierarchy { id: section.id });
        };
        let Some(tag) = registry_tag(&section.id) else {
            continue;
        };
        let mut descriptions = vec![section.name, section.body];
        descriptions.extend(section.copied);
        graph.record(tag, Definition::Structure(entry.clone()), descriptions)?;
    }
    for rule in section_scan.rule_descriptions {
        let Some(tag) = registry_tag(&rule.id) else {
            continue;
        };
        graph.append_description(tag, rule.body)?;
    }

    let table_scan = tables::scan(document);
    report.counts.table_rows = table_scan.rows.len();
    let mut tagsets = Tagsets::new();
    for row in table_scan.rows {
        let tag = if graph.contains(&row.tag) {
            row.tag
        } else {
            format!("{}{}", row.prefix, row.tag)
        };
        let Some(kind) = graph.kind_of(&tag) else {
            return Err(ExtractError::UnknownTableTag { tag });
        };
        if !matches!(kind, EntryKind::Structure) {
            return Err(ExtractError::TableKindMismatch { tag, kind });
        }
        tagsets.entry(row.heading).or_default().push(tag.clone());
        graph.append_description(&tag, row.name)?;
        graph.append_description(&tag, row.description)?;
    }

    let enum_scan = enums::scan(document, &options.equivalences)?;
    report.counts.enumeration_members = enum_scan.definitions.len();
    for (id, meaning) in enum_scan.definitions {
        let Some(tag) = registry_tag(&id) else {
            continue;
        };
        graph.record(tag, Definition::Enumeration, vec![meaning])?;
    }
    let mut memberships = enum_scan.memberships;
    memberships.extend(enums::backfill_links(document, &tagsets));
    report.counts.memberships = memberships.len();
    for (owner, member) in memberships {
        graph.add_member(&owner, &member);
    }

    let calendar_facts = calendars::scan_calendars(document);
    report.counts.calendars = calendar_facts.len();
    for fact in calendar_facts {
        graph.record(&fact.tag, Definition::Calendar, vec![fact.description])?;
    }
    let month_facts = calendars::scan_months(document);
    report.counts.months = month_facts.len();
    for fact in month_facts {
        graph.record(&fact.tag, Definition::Month, vec![fact.description])?;
    }

    graph.validate(&topology)?;
    for (kind, count) in graph.kind_counts() {
        report.counts.entries.insert(kind.name().to_string(), count);
    }
    tracing::debug!(entries = graph.len(), source = %report.source, "extraction merged");

    Ok(Extraction {
        graph,
        topology,
        prefixes,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A miniature document exercising every pass at once.
    pub(crate) const MINI_DOC: &str = "\
# The Test Registry

The tables below define short prefixes.

| Short Prefix | URI Prefix              |
| ------------ | ----------------------- |
| `g7`         | `https://terms.test/`   |

# Datatypes

## The `Text` datatype

A free-text string.

The URI for the `Text` datatype is `g7:type-Text`.

## The `Enum` datatype

A value chosen from a fixed set.

The URI for the `Enum` datatype is `g7:type-Enum`.

# Structure Grammar

The dataset is a sequence of records.

```gedstruct
n @<XREF:INDI>@ INDI {0:M} g7:record-INDI
  +1 <<NOTE_STRUCTURE>> {0:M}
  +1 RESN <Enum> {0:1} g7:RESN
```

## `NOTE_STRUCTURE` :=

```gedstruct
n NOTE <Text> {1:1} g7:NOTE
  +1 CONT <Text> {0:M}
```

A note supplies additional text.

# Structure Meaning

## `INDI` (Individual) `g7:record-INDI`

An individual record.

## `NOTE` (Note) `g7:NOTE`

A note holds extra text about its superstructure.

## `RESN` (Restriction) `g7:RESN`

A restriction on the use of a record.

# Enumeration Values

Each value's URI is formed by concatenating `g7:enum-` with the value.

### `RESN`

| Value | Meaning |
| ----- | ------- |
| `LOCKED` | Cannot be edited. |
| `PRIVACY` | Withheld from public view. |

# Calendars

## `GREGORIAN`

The default calendar. The URI for this calendar is `g7:cal-GREGORIAN`.

### `JAN`

The first month. Its URI is `g7:month-JAN`.

# End

Tail.
";

    #[test]
    fn the_mini_document_extracts_completely() {
        let document = SpecDocument::new(MINI_DOC);
        let extraction = extract(&document, "mini", &ExtractOptions::default()).unwrap();
        let graph = &extraction.graph;

        assert_eq!(graph.kind_of("RESN").unwrap().name(), "structure");
        assert_eq!(graph.kind_of("record-INDI").unwrap().name(), "structure");
        assert_eq!(graph.kind_of("type-Text").unwrap().name(), "datatype");
        assert_eq!(graph.kind_of("enum-LOCKED").unwrap().name(), "enumeration");
        assert_eq!(graph.kind_of("cal-GREGORIAN").unwrap().name(), "calendar");
        assert_eq!(graph.kind_of("month-JAN").unwrap().name(), "month");

        let members = graph.members("RESN").unwrap();
        assert!(members.contains("g7:enum-LOCKED"));
        assert!(members.contains("g7:enum-PRIVACY"));
    }

    #[test]
    fn rule_references_expand_into_the_parent() {
        let document = SpecDocument::new(MINI_DOC);
        let extraction = extract(&document, "mini", &ExtractOptions::default()).unwrap();
        let indi = extraction.graph.entry("record-INDI").unwrap();
        let topology = indi.topology().unwrap();
        assert!(topology.substructures.contains_key("g7:NOTE"));
        assert!(topology.substructures.contains_key("g7:RESN"));
    }

    #[test]
    fn rule_prose_lands_on_the_single_structure() {
        let document = SpecDocument::new(MINI_DOC);
        let extraction = extract(&document, "mini", &ExtractOptions::default()).unwrap();
        let note = extraction.graph.entry("NOTE").unwrap();
        assert_eq!(
            note.descriptions,
            vec![
                "Note",
                "A note holds extra text about its superstructure.",
                "A note supplies additional text.",
            ]
        );
    }

    #[test]
    fn missing_sections_abort_extraction() {
        let document = SpecDocument::new(
            "# A\n\n## The `Text` datatype\n\nThe URI for the `Text` datatype is `g7:type-Text`.\n\n\
## Block\n\n```gedstruct\nn ADDR <Text> {1:1} g7:ADDR\n```\n\n# End\n\nTail.\n",
        );
        let err = extract(&document, "mini", &ExtractOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "found gedstruct for g7:ADDR but no section");
    }

    #[test]
    fn sections_without_gedstruct_abort_extraction() {
        let document = SpecDocument::new(
            "# A\n\n## `GHOST` (Ghost) `g7:GHOST`\n\nNever declared in any block.\n\n# End\n\nTail.\n",
        );
        let err = extract(&document, "mini", &ExtractOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "found section for g7:GHOST but no gedstruct");
    }

    #[test]
    fn unresolvable_table_rows_abort_extraction() {
        let document = SpecDocument::new(
            "# A\n\n## Family Events\n\n| Tag | Name | Description |\n| --- | ---- | ----------- |\n\
| `XYZZ` | nonsense | Never defined anywhere. |\n\n# End\n\nTail.\n",
        );
        let err = extract(&document, "mini", &ExtractOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "found table row for FAM-XYZZ but no section or structure"
        );
    }

    #[test]
    fn table_rows_naming_non_structures_abort_extraction() {
        let document = SpecDocument::new(
            "# A\n\n## The `Abc` datatype\n\nThe URI for the `Abc` datatype is `g7:ABC`.\n\n\
## Supplemental Tags\n\n| Tag | Name | Description |\n| --- | ---- | ----------- |\n\
| `ABC` | abc | Some text. |\n\n# End\n\nTail.\n",
        );
        let err = extract(&document, "mini", &ExtractOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "found table row for ABC but that is a datatype, not a structure"
        );
    }

    #[test]
    fn enumerated_payloads_without_members_abort_extraction() {
        let document = SpecDocument::new(
            "# A\n\n## The `Enum` datatype\n\nThe URI for the `Enum` datatype is `g7:type-Enum`.\n\n\
## `RESN` (Restriction) `g7:RESN`\n\n```gedstruct\nn RESN <Enum> {0:1} g7:RESN\n```\n\nBody.\n\n# End\n\nTail.\n",
        );
        let err = extract(&document, "mini", &ExtractOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no enumeration members"));
    }

    #[test]
    fn report_counts_every_pass() {
        let document = SpecDocument::new(MINI_DOC);
        let extraction = extract(&document, "mini", &ExtractOptions::default()).unwrap();
        let counts = &extraction.report.counts;
        assert_eq!(counts.prefixes, 1);
        assert_eq!(counts.datatypes, 2);
        assert_eq!(counts.rules, 1);
        assert_eq!(counts.gedstruct_blocks, 2);
        assert_eq!(counts.calendars, 1);
        assert_eq!(counts.months, 1);
        assert_eq!(counts.entries.get("structure"), Some(&3));
    }
}
