// ABOUTME: Accordion structural decoration: authored rows become details/summary items.
// ABOUTME: The second cell of each row becomes the item body, which is the slot for nested content.

use dom_query::NodeRef;
use tracing::debug;

use crate::dom::Page;
use crate::nesting::slot::{ACCORDION_BODY_CLASS, ACCORDION_ITEM_CLASS};

pub const ACCORDION_LABEL_CLASS: &str = "accordion-item-label";

/// Turn each `<div><div>label</div><div>body</div></div>` row into
/// `<details class="accordion-item">` with a `<summary>` label and the body cell.
///
/// Rows with fewer than two cells are left untouched. Returns the item count.
pub fn decorate(page: &Page, block: &NodeRef) -> usize {
    let mut items = 0;

    for row in block.element_children() {
        let cells = row.element_children();
        let (Some(label), Some(body)) = (cells.first(), cells.get(1)) else {
            debug!("accordion row without label and body cells, skipped");
            continue;
        };

        let summary = page.new_element("summary");
        summary.set_attr("class", ACCORDION_LABEL_CLASS);
        for child in label.children() {
            child.remove_from_parent();
            summary.append_child(&child);
        }

        body.set_attr("class", ACCORDION_BODY_CLASS);

        let details = page.new_element("details");
        details.set_attr("class", ACCORDION_ITEM_CLASS);
        details.append_child(&summary);
        body.remove_from_parent();
        details.append_child(body);

        row.insert_before(&details);
        row.remove_from_parent();
        items += 1;
    }

    items
}
