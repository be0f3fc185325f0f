//! Wiki text adapter: patch sections and per-unit deltas from the patch-history article
//!
//! The article is a run of version headings, each followed by a bullet list:
//!
//! ```text
//! <h2>V25.19</h2>
//! <ul>
//!   <li>Akali
//!     <ul>
//!       <li>Outgoing damage modifier changed to 0% from -5%</li>
//!       <li>Q - Five Point Strike
//!         <ul><li>ability changes, ignored</li></ul>
//!       </li>
//!     </ul>
//!   </li>
//! </ul>
//! ```

use crate::error::{Error, Result};
use crate::rules;
use crate::stats::{Mode, StatBlock};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// One version heading and the markup following it
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSection {
    /// Version token from the heading (e.g. "25.19" or "25.19a")
    pub version: String,
    /// HTML of the sibling nodes between this heading and the next one
    pub content: String,
}

/// Stat updates keyed by display name, before name resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    /// Mode the stats apply to
    pub mode: Mode,
    entries: Vec<(String, StatBlock)>,
}

impl Delta {
    /// Create an empty delta for a mode
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    /// Overlay stats for a name; a later value for the same field wins
    pub fn insert(&mut self, name: impl Into<String>, stats: &StatBlock) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.overlay(stats),
            None => self.entries.push((name, stats.clone())),
        }
    }

    /// Stats recorded for a display name
    pub fn get(&self, name: &str) -> Option<&StatBlock> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stats)| stats)
    }

    /// Entries in first-seen document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatBlock)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of names with stats
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name has stats
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Selector(format!("{css}: {e}")))
}

/// Split the article into patch sections, in document order (newest first on the wiki)
///
/// Headings without a version token are ignored, as are sections with no
/// content. Headings wrapped in `<div class="mw-heading">` are anchored on the
/// wrapper.
pub fn extract_patch_sections(html: &str) -> Result<Vec<PatchSection>> {
    let document = Html::parse_document(html);
    let headings = selector("h1, h2, h3")?;
    let mut sections = Vec::new();

    for heading in document.select(&headings) {
        let text = heading.text().collect::<String>();
        let Some(version) = rules::version_token(&text) else {
            continue;
        };

        let tag = heading.value().name();
        let anchor = heading
            .parent()
            .and_then(ElementRef::wrap)
            .filter(is_heading_wrapper)
            .unwrap_or(heading);

        let mut content = String::new();
        for sibling in anchor.next_siblings() {
            match sibling.value() {
                Node::Text(text) => content.push_str(&escape_text(text)),
                Node::Element(_) => {
                    let Some(element) = ElementRef::wrap(sibling) else {
                        continue;
                    };
                    if is_section_boundary(element, tag) {
                        break;
                    }
                    content.push_str(&element.html());
                }
                _ => {}
            }
        }

        if content.trim().is_empty() {
            debug!(version, "skipping empty patch section");
            continue;
        }
        sections.push(PatchSection {
            version: version.to_string(),
            content,
        });
    }

    Ok(sections)
}

fn is_heading_wrapper(element: &ElementRef) -> bool {
    element.value().name() == "div" && element.value().classes().any(|c| c == "mw-heading")
}

/// Next heading of the same tag, bare or inside a heading wrapper
fn is_section_boundary(element: ElementRef, tag: &str) -> bool {
    if element.value().name() == tag {
        return true;
    }
    is_heading_wrapper(&element)
        && element
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| child.value().name() == tag)
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Text owned by an element, leaving out nested lists
fn own_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    rules::normalize_ws(&out)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if matches!(e.name(), "ul" | "ol") => {}
            Node::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    collect_text(inner, out);
                }
            }
            _ => {}
        }
    }
}

/// Extract per-unit stat updates from one section
///
/// A list item whose own text starts with a capitalized name is a unit entry.
/// Only the direct children of its first nested list are inspected, and only
/// those mentioning "modifier" are parsed as balance sentences.
pub fn parse_unit_deltas(section: &PatchSection, mode: Mode) -> Result<Delta> {
    let fragment = Html::parse_fragment(&section.content);
    let items = selector("li")?;
    let mut delta = Delta::new(mode);

    for item in fragment.select(&items) {
        let text = own_text(item);
        let Some(name) = rules::unit_name_candidate(&text) else {
            continue;
        };

        let Some(list) = item
            .children()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "ul")
        else {
            continue;
        };

        let mut stats = StatBlock::new();
        for child in list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "li")
        {
            let sentence = own_text(child);
            if !rules::is_modifier_sentence(&sentence) {
                continue;
            }
            if let Some((field, value)) = rules::parse_modifier_sentence(&sentence) {
                stats.set(field, value);
            }
        }

        if !stats.is_empty() {
            delta.insert(name, &stats);
        }
    }

    debug!(version = %section.version, units = delta.len(), "parsed section deltas");
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatField;

    const ARTICLE: &str = r#"
<html><body>
<h1>ARAM/Patch history</h1>
<p>Intro text.</p>
<h2><span class="mw-headline">V25.20</span></h2>
<ul>
  <li><a href="/Akali">Akali</a>
    <ul>
      <li>Outgoing damage modifier changed to 0% from -5%</li>
      <li>Incoming damage modifier changed to -5% from 0%</li>
      <li>Q - Five Point Strike
        <ul><li>Damage modifier changed to 10% from 5%</li></ul>
      </li>
    </ul>
  </li>
  <li>Miss Fortune
    <ul>
      <li>Healing modifier changed to +10% from 0%</li>
      <li>Ability haste modifier changed to 8 from 0</li>
    </ul>
  </li>
</ul>
<h2><span class="mw-headline">V25.19</span></h2>
<ul>
  <li>Sion
    <ul><li>Tenacity modifier changed to +20% from 0%</li></ul>
  </li>
</ul>
<h2>V25.18</h2>
<h2>References</h2>
<p>none</p>
</body></html>
"#;

    #[test]
    fn test_extract_patch_sections() {
        let sections = extract_patch_sections(ARTICLE).unwrap();
        let versions: Vec<&str> = sections.iter().map(|s| s.version.as_str()).collect();

        // V25.18 has no content and is dropped
        assert_eq!(versions, vec!["25.20", "25.19"]);
        assert!(sections[0].content.contains("Miss Fortune"));
        assert!(!sections[0].content.contains("Sion"));
    }

    #[test]
    fn test_no_sections() {
        let sections = extract_patch_sections("<html><body><h2>Overview</h2><p>x</p></body></html>").unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn test_wrapped_headings() {
        let html = r#"
<div class="mw-heading mw-heading2"><h2 id="V25.19">V25.19</h2><span class="mw-editsection">edit</span></div>
<ul><li>Sion<ul><li>Outgoing damage modifier changed to +5% from 0%</li></ul></li></ul>
<div class="mw-heading mw-heading2"><h2 id="V25.18">V25.18</h2></div>
<ul><li>Gwen<ul><li>Outgoing damage modifier changed to -5% from 0%</li></ul></li></ul>
"#;
        let sections = extract_patch_sections(html).unwrap();

        assert_eq!(sections.len(), 2);
        assert!(sections[0].content.contains("Sion"));
        assert!(!sections[0].content.contains("Gwen"));
        assert!(sections[1].content.contains("Gwen"));
    }

    #[test]
    fn test_parse_unit_deltas() {
        let sections = extract_patch_sections(ARTICLE).unwrap();
        let delta = parse_unit_deltas(&sections[0], Mode::Aram).unwrap();

        assert_eq!(delta.len(), 2);
        assert_eq!(delta.mode, Mode::Aram);

        let akali = delta.get("Akali").unwrap();
        assert_eq!(akali.get(StatField::DmgDealt), Some(1.0));
        assert_eq!(akali.get(StatField::DmgTaken), Some(0.95));
        assert_eq!(akali.len(), 2);

        let mf = delta.get("Miss Fortune").unwrap();
        assert_eq!(mf.get(StatField::Healing), Some(1.1));
        assert_eq!(mf.get(StatField::AbilityHaste), Some(8.0));
    }

    #[test]
    fn test_nested_ability_entries_are_ignored() {
        let section = PatchSection {
            version: "25.20".to_string(),
            content: r#"<ul><li>Akali<ul><li>W - Twilight Shroud<ul><li>Healing modifier changed to +50% from 0%</li></ul></li></ul></li></ul>"#.to_string(),
        };
        let delta = parse_unit_deltas(&section, Mode::Aram).unwrap();

        assert!(delta.is_empty());
    }

    #[test]
    fn test_only_first_child_list_is_inspected() {
        let section = PatchSection {
            version: "25.20".to_string(),
            content: r#"<ul><li>Akali
                <ul><li>Q - Five Point Strike</li></ul>
                <ul><li>Outgoing damage modifier changed to +5% from 0%</li></ul>
            </li></ul>"#.to_string(),
        };
        let delta = parse_unit_deltas(&section, Mode::Aram).unwrap();

        assert!(delta.is_empty());
    }

    #[test]
    fn test_second_list_ignored_when_first_has_modifiers() {
        let section = PatchSection {
            version: "25.20".to_string(),
            content: r#"<ul><li>Gwen
                <ul><li>Healing modifier changed to +10% from 0%</li></ul>
                <ul><li>Outgoing damage modifier changed to -5% from 0%</li></ul>
            </li></ul>"#.to_string(),
        };
        let delta = parse_unit_deltas(&section, Mode::Aram).unwrap();
        let gwen = delta.get("Gwen").unwrap();

        assert_eq!(gwen.get(StatField::Healing), Some(1.1));
        assert_eq!(gwen.get(StatField::DmgDealt), None);
        assert_eq!(gwen.len(), 1);
    }

    #[test]
    fn test_last_sentence_wins_within_section() {
        let section = PatchSection {
            version: "25.20".to_string(),
            content: r#"<ul><li>Gwen<ul>
                <li>Outgoing damage modifier changed to +5% from 0%</li>
                <li>Outgoing damage modifier changed to +10% from +5%</li>
            </ul></li></ul>"#.to_string(),
        };
        let delta = parse_unit_deltas(&section, Mode::Aram).unwrap();

        assert_eq!(delta.get("Gwen").unwrap().get(StatField::DmgDealt), Some(1.1));
    }

    #[test]
    fn test_delta_insert_overlays() {
        let mut delta = Delta::new(Mode::Aram);
        let first: StatBlock = [(StatField::DmgDealt, 1.05), (StatField::Healing, 0.9)]
            .into_iter()
            .collect();
        let second: StatBlock = [(StatField::DmgDealt, 0.95)].into_iter().collect();

        delta.insert("Ziggs", &first);
        delta.insert("Ziggs", &second);

        let ziggs = delta.get("Ziggs").unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(ziggs.get(StatField::DmgDealt), Some(0.95));
        assert_eq!(ziggs.get(StatField::Healing), Some(0.9));
    }
}
