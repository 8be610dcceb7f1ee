// ABOUTME: Tabs structural decoration (tablist + panels), static tab activation, and tab-section merging.
// ABOUTME: Merging folds later tabs-container sections into the first tabs block and records their nested blocks.

use dom_query::NodeRef;
use tracing::debug;

use crate::dom::page::{blocks_in, section_of, sibling_sections_with_class};
use crate::dom::tree::{find_by_class, hide, to_class_name, trimmed_text};
use crate::dom::{BlockCategory, ContainerKind, Page};
use crate::error::RelocationError;
use crate::nesting::metadata::read_metadata;
use crate::nesting::relocate::{RelocationDirective, RelocationMode, RelocationPlan};
use crate::nesting::slot::{resolve_index, slot_items, TABS_PANEL_CLASS};

pub const TABS_LIST_CLASS: &str = "tabs-list";
pub const TABS_TAB_CLASS: &str = "tabs-tab";

/// Build the tablist and turn every row into a tab panel.
///
/// Each row's first cell becomes the tab button; the rest of the row is the
/// panel. The first tab starts selected. Returns the panel count.
pub fn decorate(page: &Page, block: &NodeRef) -> usize {
    let tablist = page.new_element("div");
    tablist.set_attr("class", TABS_LIST_CLASS);
    tablist.set_attr("role", "tablist");

    let mut panels = 0;
    for (i, row) in block.element_children().into_iter().enumerate() {
        let Some(tab) = row.element_children().into_iter().next() else {
            continue;
        };
        let id = to_class_name(&trimmed_text(&tab));
        let selected = i == 0;

        row.set_attr("class", TABS_PANEL_CLASS);
        row.set_attr("id", &format!("tabpanel-{}", id));
        row.set_attr("aria-hidden", if selected { "false" } else { "true" });
        row.set_attr("aria-labelledby", &format!("tab-{}", id));
        row.set_attr("role", "tabpanel");

        let button = page.new_element("button");
        button.set_attr("class", TABS_TAB_CLASS);
        button.set_attr("id", &format!("tab-{}", id));
        for child in tab.children() {
            child.remove_from_parent();
            button.append_child(&child);
        }
        button.set_attr("aria-controls", &format!("tabpanel-{}", id));
        button.set_attr("aria-selected", if selected { "true" } else { "false" });
        button.set_attr("role", "tab");
        button.set_attr("type", "button");

        tablist.append_child(&button);
        tab.remove_from_parent();
        panels += 1;
    }

    match block.first_child() {
        Some(first) => first.insert_before(&tablist),
        None => block.append_child(&tablist),
    }

    panels
}

/// Select tab `index`: its panel shows, every other panel hides.
pub fn activate_tab(block: &NodeRef, index: usize) -> Result<(), RelocationError> {
    let panels = slot_items(block, ContainerKind::Tabs);
    if index >= panels.len() {
        return Err(RelocationError::slot_not_found(
            ContainerKind::Tabs.name(),
            "activate tab",
            Some(format!("index {} of {} panels", index, panels.len())),
        ));
    }

    for (i, panel) in panels.iter().enumerate() {
        panel.set_attr("aria-hidden", if i == index { "false" } else { "true" });
    }

    let buttons = find_by_class(block, TABS_LIST_CLASS)
        .map(|list| {
            list.element_children()
                .into_iter()
                .filter(|b| b.has_class(TABS_TAB_CLASS))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    for (i, button) in buttons.iter().enumerate() {
        button.set_attr("aria-selected", if i == index { "true" } else { "false" });
    }

    Ok(())
}

fn first_tabs_block<'a>(section: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    blocks_in(section)
        .into_iter()
        .find(|b| BlockCategory::of(b).and_then(|c| c.container_kind()) == Some(ContainerKind::Tabs))
}

/// Fold every later `tabs-container` section into `block`, the first tabs block.
///
/// Must run before structural decoration so the absorbed rows become panels.
/// Later sections are removed from the tree after their rows move. Each
/// section's remaining blocks become a directive targeting its `tabs-item`
/// metadata, or the section's position when there is none.
///
/// Returns `None` when there is nothing to merge or `block` is not the first
/// tabs block of the first section.
pub fn merge_tab_sections<'a>(block: &NodeRef<'a>) -> Option<RelocationPlan<'a>> {
    let kind = ContainerKind::Tabs;
    let section = section_of(block)?;
    if !section.has_class(kind.section_class()) {
        return None;
    }

    let sections = sibling_sections_with_class(&section, kind.section_class());
    if sections.len() <= 1 {
        return None;
    }
    if first_tabs_block(&sections[0]).map(|b| b.id) != Some(block.id) {
        debug!("tabs block is not the first of the merged sections");
        return None;
    }

    let mut directives = Vec::new();
    for (position, tab_section) in sections.iter().enumerate() {
        let tabs_block = first_tabs_block(tab_section);
        let metadata: Vec<NodeRef<'a>> = blocks_in(tab_section)
            .into_iter()
            .filter(|b| BlockCategory::of(b).map_or(false, |c| c.is_metadata()))
            .collect();

        let children: Vec<NodeRef<'a>> = blocks_in(tab_section)
            .into_iter()
            .filter(|b| BlockCategory::of(b).map_or(false, |c| !c.is_metadata()))
            .filter(|b| {
                tabs_block
                    .as_ref()
                    .map_or(true, |t| !crate::dom::tree::contains(t, b))
            })
            .collect();

        let record = metadata.first().map(read_metadata);
        for m in &metadata {
            hide(m);
        }

        if !children.is_empty() {
            debug!(
                "tab section {} holds {} nested blocks",
                position,
                children.len()
            );
            let mut directive =
                RelocationDirective::new(resolve_index(kind, record.as_ref(), position), children);
            directive.clear_placeholder = true;
            directives.push(directive);
        }

        if position > 0 {
            if let Some(other) = tabs_block {
                for row in other.element_children() {
                    row.remove_from_parent();
                    block.append_child(&row);
                }
                other.remove_from_parent();
                tab_section.remove_from_parent();
            }
        }
    }

    debug!(
        "merged {} tab sections into {} rows",
        sections.len(),
        block.element_children().len()
    );

    Some(RelocationPlan::new(RelocationMode::MergedSections, directives))
}
