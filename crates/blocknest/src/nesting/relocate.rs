// ABOUTME: Relocator that plans and performs the move of sibling blocks into a container's slots.
// ABOUTME: One algorithm parametrized by mode: same-section, cross-section, container nesting, merged sections.

//! Relocation runs in two steps.
//!
//! [`plan`] inspects the tree right after the container finished structural
//! decoration and captures every directive: which blocks move, which metadata
//! blocks are excluded, where the index comes from. The captured blocks are
//! the dependencies the caller waits on. [`execute`] then resolves each
//! directive's slot and performs the moves. Each failed directive is skipped
//! and recorded; the rest of the plan still runs.

use dom_query::{NodeId, NodeRef};
use serde::Serialize;
use tracing::{debug, warn};

use super::metadata::{read_metadata, MetadataRecord};
use super::slot::{clear_placeholder, resolve_index, slot_at, slot_count};
use crate::blocks::BlockLoader;
use crate::dom::page::{blocks_in, following_sections, metadata_in, section_of};
use crate::dom::selectors::{DIV, LANDMARK};
use crate::dom::tree::{self, contains, hide, needs_decoration, trimmed_text};
use crate::dom::{BlockCategory, ContainerKind, Page};
use crate::error::RelocationError;
use crate::options::Options;

/// Class the host adds to a section holding embed blocks.
pub const EMBED_SECTION_CLASS: &str = "embed-container";

const OP: &str = "relocate";

/// How candidate blocks are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationMode {
    /// Media blocks beside the container in its own section.
    SameSection,
    /// Content of later sections whose metadata targets the container.
    CrossSection,
    /// Other blocks of the container's section, moved whole.
    ContainerNesting,
    /// Content of tab sections folded into the first tabs block.
    MergedSections,
}

/// One move: where the blocks go and what stays behind.
#[derive(Debug, Clone)]
pub struct RelocationDirective<'a> {
    /// Slot index, or the reason none could be derived.
    pub target: Result<usize, RelocationError>,
    pub blocks: Vec<NodeRef<'a>>,
    /// Metadata blocks consumed by this directive, hidden once it succeeds.
    pub excluded: Vec<NodeRef<'a>>,
    /// Clear the slot placeholder right before the first insertion.
    pub clear_placeholder: bool,
    /// Source section emptied by the move, hidden once it succeeds.
    pub source_section: Option<NodeRef<'a>>,
}

impl<'a> RelocationDirective<'a> {
    pub fn new(target: Result<usize, RelocationError>, blocks: Vec<NodeRef<'a>>) -> Self {
        Self {
            target,
            blocks,
            excluded: Vec::new(),
            clear_placeholder: false,
            source_section: None,
        }
    }
}

/// Everything one container's relocation will do.
#[derive(Debug, Clone)]
pub struct RelocationPlan<'a> {
    pub mode: RelocationMode,
    pub directives: Vec<RelocationDirective<'a>>,
}

impl<'a> RelocationPlan<'a> {
    pub fn new(mode: RelocationMode, directives: Vec<RelocationDirective<'a>>) -> Self {
        Self { mode, directives }
    }

    /// Blocks whose decoration must finish before the plan executes.
    pub fn dependencies(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for directive in &self.directives {
            for node in &directive.blocks {
                if BlockCategory::of(node).is_some() {
                    ids.push(node.id);
                }
                ids.extend(blocks_in(node).iter().map(|b| b.id));
            }
        }
        ids
    }
}

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationReport {
    pub moved: usize,
    pub hidden: usize,
    pub skipped: Vec<RelocationError>,
}

impl RelocationReport {
    fn skip(&mut self, err: RelocationError) {
        warn!("{}", err);
        self.skipped.push(err);
    }
}

/// Decide the mode for `container` and capture its directives.
///
/// Returns `Ok(None)` when the container is not the first of its kind in its
/// section: later containers are nesting candidates, not parents.
pub fn plan<'a>(
    container: &NodeRef<'a>,
    kind: ContainerKind,
    opts: &Options,
) -> Result<Option<RelocationPlan<'a>>, RelocationError> {
    let section = section_of(container).ok_or_else(|| {
        RelocationError::section_not_found(kind.name(), OP, Some("container is outside any section".to_string()))
    })?;

    let section_blocks = blocks_in(&section);
    let first_of_kind = section_blocks
        .iter()
        .find(|b| BlockCategory::of(b).and_then(|c| c.container_kind()) == Some(kind));
    if first_of_kind.map(|b| b.id) != Some(container.id) {
        debug!("{} block is not the first of its section, no relocation", kind);
        return Ok(None);
    }

    let children = nesting_candidates(&section, container, kind);
    if !children.is_empty() {
        return Ok(Some(plan_container_nesting(&section, kind, children)));
    }

    if let Some(metadata) = metadata_in(&section) {
        return Ok(Some(plan_same_section(&section, container, kind, Some(metadata), opts)));
    }

    if opts.embed_container_fallback && section.has_class(EMBED_SECTION_CLASS) {
        return Ok(Some(plan_same_section(&section, container, kind, None, opts)));
    }

    Ok(Some(plan_cross_section(&section, container, kind)))
}

/// Blocks of `section` that nest into `container`: the other containers of
/// the same kind, outermost only, since inner ones travel with their parent.
///
/// A tabs block in a `tabs-container` section also takes every other block
/// that is not metadata.
fn nesting_candidates<'a>(
    section: &NodeRef<'a>,
    container: &NodeRef<'a>,
    kind: ContainerKind,
) -> Vec<NodeRef<'a>> {
    let takes_all = kind == ContainerKind::Tabs && section.has_class(kind.section_class());
    let loose: Vec<NodeRef<'a>> = blocks_in(section)
        .into_iter()
        .filter(|b| match BlockCategory::of(b) {
            Some(category) if category.is_metadata() => false,
            Some(category) => takes_all || category.container_kind() == Some(kind),
            None => false,
        })
        .filter(|b| !contains(container, b) && !contains(b, container))
        .collect();

    loose
        .iter()
        .filter(|b| !loose.iter().any(|other| other.id != b.id && contains(other, b)))
        .cloned()
        .collect()
}

fn plan_container_nesting<'a>(
    section: &NodeRef<'a>,
    kind: ContainerKind,
    children: Vec<NodeRef<'a>>,
) -> RelocationPlan<'a> {
    let metadata = metadata_in(section);
    let record = metadata.as_ref().map(read_metadata);

    let mut directive = RelocationDirective::new(resolve_index(kind, record.as_ref(), 0), children);
    directive.excluded = metadata.into_iter().collect();
    directive.clear_placeholder = true;

    RelocationPlan::new(RelocationMode::ContainerNesting, vec![directive])
}

fn plan_same_section<'a>(
    section: &NodeRef<'a>,
    container: &NodeRef<'a>,
    kind: ContainerKind,
    metadata: Option<NodeRef<'a>>,
    opts: &Options,
) -> RelocationPlan<'a> {
    let record = metadata.as_ref().map(read_metadata);
    let embed_fallback = opts.embed_container_fallback && section.has_class(EMBED_SECTION_CLASS);

    let target = match record {
        Some(ref r) if r.targets(kind) => resolve_index(kind, Some(r), 0),
        _ if embed_fallback => last_slot(container, kind),
        _ => Err(RelocationError::metadata_missing(
            kind.name(),
            OP,
            Some(format!(
                "section metadata does not name parent {} with {}",
                kind,
                kind.index_key()
            )),
        )),
    };

    let media: Vec<NodeRef<'a>> = blocks_in(section)
        .into_iter()
        .filter(|b| BlockCategory::of(b).map_or(false, |c| c.is_media()))
        .filter(|b| !contains(container, b))
        .collect();

    let mut directive = RelocationDirective::new(target, media);
    // Every metadata block of an embed section is consumed, not only the first.
    directive.excluded = if embed_fallback {
        blocks_in(section)
            .into_iter()
            .filter(|b| BlockCategory::of(b).map_or(false, |c| c.is_metadata()))
            .collect()
    } else {
        metadata.into_iter().collect()
    };

    RelocationPlan::new(RelocationMode::SameSection, vec![directive])
}

fn last_slot(container: &NodeRef, kind: ContainerKind) -> Result<usize, RelocationError> {
    slot_count(container, kind).checked_sub(1).ok_or_else(|| {
        RelocationError::slot_not_found(kind.name(), OP, Some("container has no slots".to_string()))
    })
}

fn plan_cross_section<'a>(
    section: &NodeRef<'a>,
    container: &NodeRef<'a>,
    kind: ContainerKind,
) -> RelocationPlan<'a> {
    let mut directives = Vec::new();

    for later in following_sections(section) {
        if tree::is_hidden(&later) {
            continue;
        }
        let Some(metadata) = metadata_in(&later) else {
            continue;
        };
        let record: MetadataRecord = read_metadata(&metadata);
        if !record.targets(kind) {
            continue;
        }

        let blocks: Vec<NodeRef<'a>> = later
            .element_children()
            .into_iter()
            .filter(|child| !contains(child, &metadata))
            .filter(|child| BlockCategory::of(child).is_some() || child.is_match(&DIV))
            .collect();

        let mut directive = RelocationDirective::new(resolve_index(kind, Some(&record), 0), blocks);
        directive.excluded = vec![metadata];
        directive.source_section = Some(later);
        directives.push(directive);
    }

    RelocationPlan::new(RelocationMode::CrossSection, directives)
}

/// Perform a plan against a decorated container.
pub fn execute(
    page: &Page,
    container: &NodeRef,
    kind: ContainerKind,
    plan: RelocationPlan,
    loader: &dyn BlockLoader,
) -> RelocationReport {
    let mut report = RelocationReport::default();

    for directive in plan.directives {
        let index = match directive.target {
            Ok(index) => index,
            Err(err) => {
                report.skip(err);
                continue;
            }
        };
        let slot = match slot_at(container, kind, index) {
            Ok(slot) => slot,
            Err(err) => {
                report.skip(err);
                continue;
            }
        };

        let mut cleared = !directive.clear_placeholder;
        let mut taken = false;
        for block in directive.blocks {
            // Another container targeting the same section may have taken it first.
            if let Some(source) = &directive.source_section {
                if !contains(source, &block) {
                    debug!("{} block already left its section, skipping", describe(&block));
                    taken = true;
                    continue;
                }
            }
            // The tree may have shifted while waiting; never move an ancestor into its descendant.
            if contains(&block, &slot.node) {
                debug!("skipping {} block that encloses the target slot", describe(&block));
                continue;
            }
            if !cleared {
                if clear_placeholder(&slot) {
                    debug!("cleared placeholder of {} slot {}", kind, slot.index);
                }
                cleared = true;
            }

            let former_parent = block.parent();
            block.remove_from_parent();
            slot.node.append_child(&block);
            report.moved += 1;
            debug!("moved {} into {} slot {}", describe(&block), kind, slot.index);

            if let Some(parent) = former_parent {
                if hide_if_emptied(&parent) {
                    report.hidden += 1;
                }
            }
            load_moved(page, &block, loader);
        }

        for metadata in &directive.excluded {
            hide(metadata);
        }
        if taken {
            continue;
        }
        if let Some(section) = directive.source_section {
            hide(&section);
            report.hidden += 1;
        }
    }

    report
}

/// Hide a wrapper left empty by a move. Sections are left to their directive.
fn hide_if_emptied(node: &NodeRef) -> bool {
    if !node.is_element() || node.is_match(&LANDMARK) || tree::is_hidden(node) {
        return false;
    }
    if !node.element_children().is_empty() || !trimmed_text(node).is_empty() {
        return false;
    }
    hide(node);
    true
}

/// Decorate any block that arrived in its slot still undecorated.
fn load_moved(page: &Page, node: &NodeRef, loader: &dyn BlockLoader) {
    let mut pending: Vec<NodeRef> = Vec::new();
    if BlockCategory::of(node).is_some() {
        pending.push(node.clone());
    }
    pending.extend(blocks_in(node));

    for block in pending {
        if needs_decoration(&block) {
            debug!("loading moved {} block", describe(&block));
            loader.load(page, &block);
        }
    }
}

fn describe(node: &NodeRef) -> String {
    match BlockCategory::of(node) {
        Some(category) => category.marker().to_string(),
        None => node
            .attr("class")
            .map(|c| c.to_string())
            .unwrap_or_else(|| "element".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{decorate_structure, StructuralLoader};
    use crate::dom::tree::{find_by_class, is_hidden};
    use crate::nesting::slot::slot_items;

    fn decorated(html: &str) -> Page {
        let page = Page::parse(html);
        for block in page.blocks() {
            decorate_structure(&page, &block);
        }
        page
    }

    fn run(page: &Page, class: &str, kind: ContainerKind) -> (RelocationMode, RelocationReport) {
        let container = find_by_class(&page.root(), class).unwrap();
        let plan = plan(&container, kind, &Options::default()).unwrap().unwrap();
        let mode = plan.mode;
        (mode, execute(page, &container, kind, plan, &StructuralLoader))
    }

    const TWO_ITEM_ACCORDION: &str = r#"
        <div class="accordion-wrapper"><div class="accordion block">
          <div><div>One</div><div><p>first</p></div></div>
          <div><div>Two</div><div><p>second</p></div></div>
        </div></div>"#;

    #[test]
    fn test_same_section_with_embed_fallback_targets_last_slot() {
        let page = decorated(&format!(
            r#"<main><div class="section accordion-container embed-container">
                 {}
                 <div class="embed-wrapper"><div class="embed block">E1</div></div>
                 <div class="metadata-wrapper"><div class="metadata block">
                   <div><div>note</div><div>unrelated</div></div>
                 </div></div>
               </div></main>"#,
            TWO_ITEM_ACCORDION
        ));

        let (mode, report) = run(&page, "accordion", ContainerKind::Accordion);
        assert_eq!(mode, RelocationMode::SameSection);
        assert_eq!(report.moved, 1);
        assert!(report.skipped.is_empty());

        let accordion = find_by_class(&page.root(), "accordion").unwrap();
        let last = slot_at(&accordion, ContainerKind::Accordion, 1).unwrap();
        assert!(find_by_class(&last.node, "embed").is_some());
        assert!(is_hidden(&find_by_class(&page.root(), "metadata").unwrap()));
        // the emptied wrapper is hidden, not removed
        assert!(is_hidden(&find_by_class(&page.root(), "embed-wrapper").unwrap()));
    }

    #[test]
    fn test_same_section_metadata_for_other_kind_is_skipped() {
        let page = decorated(&format!(
            r#"<main><div class="section">
                 {}
                 <div class="embed block">E1</div>
                 <div class="metadata block">
                   <div><div>parent</div><div>tabs</div></div>
                   <div><div>tabs-item</div><div>0</div></div>
                 </div>
               </div></main>"#,
            TWO_ITEM_ACCORDION
        ));

        let (mode, report) = run(&page, "accordion", ContainerKind::Accordion);
        assert_eq!(mode, RelocationMode::SameSection);
        assert_eq!(report.moved, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].is_metadata_missing());
        // content stays visible in place
        let metadata = find_by_class(&page.root(), "metadata").unwrap();
        assert!(!is_hidden(&metadata));
        let embed = find_by_class(&page.root(), "embed").unwrap();
        assert!(section_of(&embed).is_some());
        assert!(!contains(&find_by_class(&page.root(), "accordion").unwrap(), &embed));
    }

    #[test]
    fn test_cross_section_scans_past_another_container_of_same_kind() {
        let page = decorated(&format!(
            r#"<main>
                 <div class="section">{}</div>
                 <div class="section second">
                   <div class="accordion block other"><div><div>Other</div><div>x</div></div></div>
                 </div>
                 <div class="section third">
                   <div class="metadata block">
                     <div><div>parent</div><div>accordion</div></div>
                     <div><div>accordion-item</div><div>0</div></div>
                   </div>
                   <div class="cards block">late</div>
                 </div>
               </main>"#,
            TWO_ITEM_ACCORDION
        ));

        let (mode, report) = run(&page, "accordion", ContainerKind::Accordion);
        assert_eq!(mode, RelocationMode::CrossSection);
        assert_eq!(report.moved, 1);
        assert!(report.skipped.is_empty());

        let accordion = find_by_class(&page.root(), "accordion").unwrap();
        let slot0 = slot_at(&accordion, ContainerKind::Accordion, 0).unwrap();
        assert!(find_by_class(&slot0.node, "cards").is_some());
        assert!(is_hidden(&find_by_class(&page.root(), "third").unwrap()));
        assert!(!is_hidden(&find_by_class(&page.root(), "second").unwrap()));
    }

    #[test]
    fn test_cross_section_skips_blocks_taken_by_earlier_container() {
        let page = decorated(&format!(
            r#"<main>
                 <div class="section">{}</div>
                 <div class="section second">
                   <div class="accordion block other"><div><div>Other</div><div></div></div></div>
                 </div>
                 <div class="section third">
                   <div class="metadata block">
                     <div><div>parent</div><div>accordion</div></div>
                     <div><div>accordion-item</div><div>0</div></div>
                   </div>
                   <div class="cards block">late</div>
                 </div>
               </main>"#,
            TWO_ITEM_ACCORDION
        ));

        let first = find_by_class(&page.root(), "accordion").unwrap();
        let other = find_by_class(&page.root(), "other").unwrap();
        let kind = ContainerKind::Accordion;
        let first_plan = plan(&first, kind, &Options::default()).unwrap().unwrap();
        let other_plan = plan(&other, kind, &Options::default()).unwrap().unwrap();

        let report = execute(&page, &first, kind, first_plan, &StructuralLoader);
        assert_eq!(report.moved, 1);
        let report = execute(&page, &other, kind, other_plan, &StructuralLoader);
        assert_eq!(report.moved, 0);
        assert_eq!(report.hidden, 0);
        assert!(report.skipped.is_empty());

        let cards = find_by_class(&page.root(), "cards").unwrap();
        assert!(contains(&first, &cards));
        assert!(!contains(&other, &cards));
    }

    #[test]
    fn test_later_container_in_section_has_no_plan() {
        let page = decorated(
            r#"<main><div class="section">
                 <div class="tabs block"><div><div>A</div><div>a</div></div></div>
                 <div class="tabs block second"><div><div>B</div><div>b</div></div></div>
               </div></main>"#,
        );
        let second = find_by_class(&page.root(), "second").unwrap();
        assert!(plan(&second, ContainerKind::Tabs, &Options::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_container_outside_section_is_section_not_found() {
        let page = decorated(
            r#"<main><div class="accordion block"><div><div>A</div><div>a</div></div></div></main>"#,
        );
        let accordion = find_by_class(&page.root(), "accordion").unwrap();
        let err = plan(&accordion, ContainerKind::Accordion, &Options::default()).unwrap_err();
        assert!(err.is_section_not_found());
    }

    #[test]
    fn test_nesting_moves_undecorated_child_and_loads_it() {
        let page = Page::parse(
            r#"<main><div class="section tabs-container">
                 <div class="tabs block parent"><div><div>A</div><div><div>placeholder</div></div></div></div>
                 <div class="accordion block"><div><div>Q</div><div>answer</div></div></div>
               </div></main>"#,
        );
        let parent = find_by_class(&page.root(), "parent").unwrap();
        decorate_structure(&page, &parent);

        let (mode, report) = run(&page, "parent", ContainerKind::Tabs);
        assert_eq!(mode, RelocationMode::ContainerNesting);
        assert_eq!(report.moved, 1);

        let panel = slot_items(&parent, ContainerKind::Tabs).into_iter().next().unwrap();
        assert!(!trimmed_text(&panel).contains("placeholder"));
        let accordion = find_by_class(&panel, "accordion").unwrap();
        assert_eq!(accordion.attr("data-block-status").unwrap().to_string(), "loaded");
        assert!(find_by_class(&accordion, "accordion-item").is_some());
    }

    #[test]
    fn test_nesting_takes_only_containers_of_same_kind() {
        let page = decorated(
            r#"<main><div class="section">
                 <div class="accordion block parent"><div><div>P</div><div></div></div></div>
                 <div class="accordion block child"><div><div>C</div><div>c</div></div></div>
                 <div class="cards block">stays</div>
                 <div class="tabs block"><div><div>T</div><div>t</div></div></div>
               </div></main>"#,
        );

        let (mode, report) = run(&page, "parent", ContainerKind::Accordion);
        assert_eq!(mode, RelocationMode::ContainerNesting);
        assert_eq!(report.moved, 1);

        let parent = find_by_class(&page.root(), "parent").unwrap();
        assert!(contains(&parent, &find_by_class(&page.root(), "child").unwrap()));
        assert!(!contains(&parent, &find_by_class(&page.root(), "cards").unwrap()));
        assert!(!contains(&parent, &find_by_class(&page.root(), "tabs").unwrap()));
    }

    #[test]
    fn test_tabs_outside_tabs_section_do_not_nest_siblings() {
        let page = decorated(
            r#"<main><div class="section">
                 <div class="tabs block"><div><div>A</div><div>a</div></div></div>
                 <div class="cards block">c</div>
               </div></main>"#,
        );
        let tabs = find_by_class(&page.root(), "tabs").unwrap();
        let plan = plan(&tabs, ContainerKind::Tabs, &Options::default()).unwrap().unwrap();
        assert_eq!(plan.mode, RelocationMode::CrossSection);
        assert!(plan.directives.is_empty());
    }

    #[test]
    fn test_dependencies_cover_moved_blocks() {
        let page = decorated(
            r#"<main><div class="section tabs-container">
                 <div class="tabs block"><div><div>A</div><div>a</div></div></div>
                 <div class="cards-wrapper"><div class="cards block">c</div></div>
                 <div class="embed block">e</div>
               </div></main>"#,
        );
        let tabs = find_by_class(&page.root(), "tabs").unwrap();
        let plan = plan(&tabs, ContainerKind::Tabs, &Options::default()).unwrap().unwrap();
        let deps = plan.dependencies();
        let cards = find_by_class(&page.root(), "cards").unwrap();
        let embed = find_by_class(&page.root(), "embed").unwrap();
        assert_eq!(deps, vec![cards.id, embed.id]);
    }
}
