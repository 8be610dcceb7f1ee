// ABOUTME: Tree traversal and mutation helpers shared by decoration and relocation.
// ABOUTME: Selector-driven queries, closest-ancestor lookup, text reads, and display suppression.

use dom_query::{Matcher, NodeRef, Selection};
use once_cell::sync::Lazy;
use regex::Regex;

use super::selectors;

/// Class carried by every block element.
pub const BLOCK_CLASS: &str = "block";

/// Block lifecycle attribute.
pub const STATUS_ATTR: &str = "data-block-status";

pub const STATUS_INITIALIZED: &str = "initialized";
pub const STATUS_LOADED: &str = "loaded";

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-z]+").unwrap());

/// Every descendant of `node` matching `matcher`, in document order.
pub fn select<'a>(node: &NodeRef<'a>, matcher: &Matcher) -> Vec<NodeRef<'a>> {
    Selection::from(node.clone())
        .select_matcher(matcher)
        .nodes()
        .to_vec()
}

/// First descendant of `node` matching `matcher`.
pub fn select_first<'a>(node: &NodeRef<'a>, matcher: &Matcher) -> Option<NodeRef<'a>> {
    Selection::from(node.clone())
        .select_single_matcher(matcher)
        .nodes()
        .first()
        .cloned()
}

/// First descendant element carrying `class`, in document order.
pub fn find_by_class<'a>(node: &NodeRef<'a>, class: &str) -> Option<NodeRef<'a>> {
    selectors::class(class).and_then(|m| select_first(node, &m))
}

/// Every descendant element carrying `class`, in document order.
pub fn select_by_class<'a>(node: &NodeRef<'a>, class: &str) -> Vec<NodeRef<'a>> {
    selectors::class(class)
        .map(|m| select(node, &m))
        .unwrap_or_default()
}

/// Nearest ancestor-or-self matching `matcher`.
pub fn closest<'a>(node: &NodeRef<'a>, matcher: &Matcher) -> Option<NodeRef<'a>> {
    if node.is_match(matcher) {
        return Some(node.clone());
    }
    node.ancestors_it(None).find(|el| el.is_match(matcher))
}

/// Direct element children of `node` matching `matcher`.
pub fn children_matching<'a>(node: &NodeRef<'a>, matcher: &Matcher) -> Vec<NodeRef<'a>> {
    node.element_children()
        .into_iter()
        .filter(|el| el.is_match(matcher))
        .collect()
}

/// True when `ancestor` is `node` or one of its ancestors.
pub fn contains(ancestor: &NodeRef, node: &NodeRef) -> bool {
    node.id == ancestor.id || node.ancestors_it(None).any(|el| el.id == ancestor.id)
}

/// Trimmed text content of a node.
pub fn trimmed_text(node: &NodeRef) -> String {
    node.text().trim().to_string()
}

/// Hide an element from rendering without removing it from the tree.
///
/// Existing inline styles are kept; the suppression is appended.
pub fn hide(node: &NodeRef) {
    if is_hidden(node) {
        return;
    }
    let style = match node.attr("style") {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{}; display: none", existing.trim().trim_end_matches(';'))
        }
        _ => "display: none".to_string(),
    };
    node.set_attr("style", &style);
}

/// True when the element carries an inline `display: none`.
pub fn is_hidden(node: &NodeRef) -> bool {
    node.attr("style").map_or(false, |style| {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        compact.to_ascii_lowercase().contains("display:none")
    })
}

/// True when the block still needs its own decoration pass.
pub fn needs_decoration(node: &NodeRef) -> bool {
    match node.attr(STATUS_ATTR) {
        None => true,
        Some(status) => &*status == STATUS_INITIALIZED,
    }
}

/// Mark a block as decorated.
pub fn mark_loaded(node: &NodeRef) {
    node.set_attr(STATUS_ATTR, STATUS_LOADED);
}

/// Convert free text into a class-safe identifier.
///
/// Lowercases, collapses every run of characters outside `[0-9a-z]` into a single
/// `-`, and trims dashes from both ends.
pub fn to_class_name(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_query::Document;

    const SAMPLE_HTML: &str = r#"
        <main>
          <div class="section one">
            <div class="wrap"><p class="target">first</p></div>
            <p class="target">second</p>
          </div>
        </main>
    "#;

    #[test]
    fn test_select_with_matcher_in_document_order() {
        let doc = Document::from(SAMPLE_HTML);
        let section = select_first(&doc.root(), &selectors::SECTION).unwrap();
        let divs = select(&section, &selectors::DIV);
        assert_eq!(divs.len(), 1);
        assert!(divs[0].has_class("wrap"));
        assert!(find_by_class(&doc.root(), "missing").is_none());
        assert!(select_by_class(&doc.root(), "bad class!").is_empty());
    }

    #[test]
    fn test_children_matching_skips_grandchildren() {
        let doc = Document::from(SAMPLE_HTML);
        let section = select_first(&doc.root(), &selectors::SECTION).unwrap();
        let direct = children_matching(&section, &selectors::class("target").unwrap());
        assert_eq!(direct.len(), 1);
        assert_eq!(trimmed_text(&direct[0]), "second");
    }

    #[test]
    fn test_select_by_class_order() {
        let doc = Document::from(SAMPLE_HTML);
        let targets = select_by_class(&doc.root(), "target");
        let texts: Vec<String> = targets.iter().map(trimmed_text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_closest_includes_self() {
        let doc = Document::from(SAMPLE_HTML);
        let section = find_by_class(&doc.root(), "section").unwrap();
        let found = closest(&section, &selectors::SECTION).unwrap();
        assert_eq!(found.id, section.id);

        let target = find_by_class(&doc.root(), "target").unwrap();
        let up = closest(&target, &selectors::SECTION).unwrap();
        assert_eq!(up.id, section.id);
        assert!(contains(&section, &target));
        assert!(!contains(&target, &section));
    }

    #[test]
    fn test_hide_keeps_existing_style() {
        let doc = Document::from(r#"<div class="x" style="color: red;">hi</div>"#);
        let el = find_by_class(&doc.root(), "x").unwrap();
        assert!(!is_hidden(&el));
        hide(&el);
        assert!(is_hidden(&el));
        assert_eq!(el.attr("style").unwrap().to_string(), "color: red; display: none");
        hide(&el);
        assert_eq!(el.attr("style").unwrap().to_string(), "color: red; display: none");
    }

    #[test]
    fn test_needs_decoration() {
        let doc = Document::from(
            r#"<div class="a"></div><div class="b" data-block-status="initialized"></div>
               <div class="c" data-block-status="loaded"></div>"#,
        );
        let root = doc.root();
        assert!(needs_decoration(&find_by_class(&root, "a").unwrap()));
        assert!(needs_decoration(&find_by_class(&root, "b").unwrap()));
        assert!(!needs_decoration(&find_by_class(&root, "c").unwrap()));
    }

    #[test]
    fn test_to_class_name() {
        assert_eq!(to_class_name("Getting Started"), "getting-started");
        assert_eq!(to_class_name("  FAQ & Help! "), "faq-help");
        assert_eq!(to_class_name("Tab 2"), "tab-2");
        assert_eq!(to_class_name("---"), "");
    }
}
