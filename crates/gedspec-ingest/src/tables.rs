//! Tag tables.
//!
//! Tables headed `Tag | Name | Description` enrich structures that were
//! already defined elsewhere. Rows name a bare tag; when the bare tag has no
//! graph entry and the table's section heading starts with "Fam" or "Indi"
//! the tag is retried with a `FAM-` or `INDI-` prefix. The section heading
//! also names a tagset grouping the resolved tags, which the enumeration
//! link pass consumes later.

use std::collections::BTreeMap;

use regex::Regex;

use crate::document::SpecDocument;

/// Table heading mapped to the resolved tags of its rows, in row order.
pub type Tagsets = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTableRow {
    pub heading: String,
    /// Fallback prefix implied by the heading, possibly empty.
    pub prefix: String,
    pub tag: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct TableScan {
    pub rows: Vec<TagTableRow>,
}

pub fn scan(document: &SpecDocument) -> TableScan {
    let table = Regex::new(
        r"\n#+ (\S[-A-Za-z0-9 ]*[a-z0-9])[^#]*?Tag *\| *Name[^|\n]*\| *Description[^\n]*((?:\n[^\n|]*\|[^\n|]*\|[^\n]*)*)",
    )
    .unwrap();
    let row = Regex::new(r"`([A-Z_0-9]+)` *\| *([^|\n]*?) *\| *([^|\n]*[^ |\n]) *").unwrap();

    let mut out = TableScan::default();
    for caps in table.captures_iter(document.text()) {
        let heading = caps[1].to_string();
        let prefix = if heading.starts_with("Fam") {
            "FAM-"
        } else if heading.starts_with("Indi") {
            "INDI-"
        } else {
            ""
        };
        for fields in row.captures_iter(&caps[2]) {
            let mut name = fields[2].to_string();
            if let Some(cut) = name.find("<br") {
                name.truncate(cut);
            }
            out.rows.push(TagTableRow {
                heading: heading.clone(),
                prefix: prefix.to_string(),
                tag: fields[1].to_string(),
                name: name.trim().to_string(),
                description: fields[3].trim().to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Tag Reference

## Events

As defined below.

| Tag    | Name<br/>URI | Description |
| ------ | ------------ | ----------- |
| `ADOP` | adoption<br/>`g7:ADOP` | Creation of a legal parent-child relation. |
| `BIRT` | birth | Entry into life. |

## Family Attributes

| Tag | Name | Description |
| --- | ---- | ----------- |
| `NCHI` | number of children | Reported count of children. |
";

    #[test]
    fn rows_carry_heading_and_cells() {
        let scan = scan(&SpecDocument::new(DOC));
        assert_eq!(scan.rows.len(), 3);
        let adop = &scan.rows[0];
        assert_eq!(adop.heading, "Events");
        assert_eq!(adop.tag, "ADOP");
        assert_eq!(adop.name, "adoption");
        assert_eq!(
            adop.description,
            "Creation of a legal parent-child relation."
        );
    }

    #[test]
    fn br_markup_truncates_the_name_cell() {
        let scan = scan(&SpecDocument::new(DOC));
        assert_eq!(scan.rows[0].name, "adoption");
        assert_eq!(scan.rows[1].name, "birth");
    }

    #[test]
    fn fam_and_indi_headings_imply_prefixes() {
        let scan = scan(&SpecDocument::new(DOC));
        assert_eq!(scan.rows[0].prefix, "");
        assert_eq!(scan.rows[2].prefix, "FAM-");
        assert_eq!(scan.rows[2].tag, "NCHI");
    }

    #[test]
    fn tables_without_the_header_row_are_skipped() {
        let doc = SpecDocument::new("\n## Other\n\n| Left | Right |\n| `A` | text |\n");
        assert!(scan(&doc).rows.is_empty());
    }
}
