// ABOUTME: The Decorator drives one decoration pass over a page: structural decoration, then relocation.
// ABOUTME: Each block runs as its own future; relocation awaits completion signals instead of fixed delays.

use std::sync::Arc;

use dom_query::NodeRef;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::blocks::{decorate_structure, tabs, BlockLoader};
use crate::dom::tree::{contains, needs_decoration};
use crate::dom::{BlockCategory, ContainerKind, Page};
use crate::error::RelocationError;
use crate::nesting::relocate;
use crate::options::{DecoratorBuilder, Options};
use crate::result::{ContainerReport, PageReport};

/// Decorates pages.
#[derive(Clone)]
pub struct Decorator {
    opts: Options,
    loader: Arc<dyn BlockLoader + Send + Sync>,
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator").field("opts", &self.opts).finish()
    }
}

impl Decorator {
    pub fn new(opts: Options, loader: Arc<dyn BlockLoader + Send + Sync>) -> Self {
        Self { opts, loader }
    }

    /// Create a new DecoratorBuilder.
    pub fn builder() -> DecoratorBuilder {
        DecoratorBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Parse `html`, decorate it, and serialize the result.
    pub async fn decorate_html(&self, html: &str) -> (String, PageReport) {
        let page = Page::parse(html);
        let report = self.decorate_page(&page).await;
        (page.html(), report)
    }

    /// Decorate every block of `page`.
    ///
    /// Blocks are discovered once, in document order, and each gets its own
    /// future. All futures run on the calling task, so the page never crosses
    /// threads. A second pass over the same page is a no-op.
    pub async fn decorate_page(&self, page: &Page) -> PageReport {
        let blocks = page.blocks();
        debug!("decorating {} blocks", blocks.len());

        let passes = blocks
            .into_iter()
            .map(|block| self.decorate_block(page, block));

        let mut report = PageReport::default();
        for (decorated, container) in join_all(passes).await {
            if decorated {
                report.decorated += 1;
            }
            report.containers.extend(container);
        }

        info!(
            "page decorated: {} blocks, {} moved, {} hidden",
            report.decorated,
            report.moved(),
            report.hidden()
        );
        report
    }

    /// Decorate one block and, for containers, relocate their nested content.
    ///
    /// Returns whether structural decoration ran, and the container report when
    /// the block attempted relocation.
    async fn decorate_block<'a>(
        &self,
        page: &'a Page,
        block: NodeRef<'a>,
    ) -> (bool, Option<ContainerReport>) {
        let tracker = page.tracker();
        let Some(category) = BlockCategory::of(&block) else {
            return (false, None);
        };

        // Absorbed into another block before its turn; whoever moves it loads it.
        if !contains(&page.root(), &block) {
            debug!("{} block left the page before decoration", category);
            tracker.complete(block.id);
            return (false, None);
        }

        let kind = category.container_kind();
        let merged = match kind {
            Some(ContainerKind::Tabs) if self.opts.merge_tab_sections && needs_decoration(&block) => {
                tabs::merge_tab_sections(&block)
            }
            _ => None,
        };

        let decorated = decorate_structure(page, &block);
        tracker.complete(block.id);

        let Some(kind) = kind else {
            return (decorated, None);
        };
        if !tracker.claim_relocation(block.id) {
            debug!("{} block already relocated, skipping", kind);
            return (decorated, None);
        }

        let plan = match merged {
            Some(plan) => plan,
            None => match relocate::plan(&block, kind, &self.opts) {
                Ok(Some(plan)) => plan,
                Ok(None) => return (decorated, None),
                Err(err) => {
                    warn!("{}", err);
                    let mut report = ContainerReport::idle(kind);
                    report.skipped.push(err);
                    return (decorated, Some(report));
                }
            },
        };

        let mode = plan.mode;
        let dependencies = plan.dependencies();
        debug!(
            "{} block plans {:?} with {} directives, awaiting {} blocks",
            kind,
            mode,
            plan.directives.len(),
            dependencies.len()
        );

        if let Err(pending) = page
            .tracker()
            .wait_for(&dependencies, self.opts.settle_timeout)
            .await
        {
            let err = RelocationError::decoration_timeout(
                kind.name(),
                "await decoration",
                Some(format!(
                    "{} of {} blocks did not finish within {:?}",
                    pending.len(),
                    dependencies.len(),
                    self.opts.settle_timeout
                )),
            );
            warn!("{}", err);
            let mut report = ContainerReport::idle(kind);
            report.mode = Some(mode);
            report.skipped.push(err);
            return (decorated, Some(report));
        }

        let outcome = relocate::execute(page, &block, kind, plan, self.loader.as_ref());
        (
            decorated,
            Some(ContainerReport {
                kind,
                mode: Some(mode),
                moved: outcome.moved,
                hidden: outcome.hidden,
                skipped: outcome.skipped,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree::{find_by_class, is_hidden};
    use crate::nesting::slot::slot_items;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl BlockLoader for Arc<CountingLoader> {
        fn load(&self, page: &Page, block: &NodeRef<'_>) {
            self.loads.fetch_add(1, Ordering::SeqCst);
            decorate_structure(page, block);
        }
    }

    #[tokio::test]
    async fn test_merged_tab_sections_nest_their_blocks() {
        let loader = Arc::new(CountingLoader::default());
        let decorator = Decorator::builder().loader(loader.clone()).build();
        let page = Page::parse(
            r#"<main>
                 <div class="section tabs-container">
                   <div class="tabs block"><div><div>One</div><div><div>first placeholder</div></div></div></div>
                 </div>
                 <div class="section tabs-container">
                   <div class="tabs block"><div><div>Two</div><div><div>second placeholder</div></div></div></div>
                   <div class="accordion block"><div><div>Q</div><div>A</div></div></div>
                 </div>
               </main>"#,
        );

        let report = decorator.decorate_page(&page).await;
        assert!(report.is_clean());
        assert_eq!(report.moved(), 1);
        assert_eq!(page.sections().len(), 1);

        let tabs = find_by_class(&page.root(), "tabs").unwrap();
        let panels = slot_items(&tabs, ContainerKind::Tabs);
        assert_eq!(panels.len(), 2);
        assert!(find_by_class(&panels[1], "accordion-item").is_some());
        assert!(!page.html().contains("second placeholder"));
        assert!(page.html().contains("first placeholder"));
        // the accordion was absorbed before its own pass and loaded after the move
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_merging_can_be_disabled() {
        let decorator = Decorator::builder().merge_tab_sections(false).build();
        let page = Page::parse(
            r#"<main>
                 <div class="section tabs-container"><div class="tabs block"><div><div>One</div><div>1</div></div></div></div>
                 <div class="section tabs-container"><div class="tabs block"><div><div>Two</div><div>2</div></div></div></div>
               </main>"#,
        );

        decorator.decorate_page(&page).await;
        assert_eq!(page.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_unfinished_dependency_times_out() {
        let decorator = Decorator::builder()
            .settle_timeout(Duration::from_millis(20))
            .build();
        let page = Page::parse(
            r#"<main><div class="section tabs-container">
                 <div class="tabs block"><div><div>One</div><div>1</div></div></div>
                 <div class="cards block">c</div>
               </div></main>"#,
        );
        let tabs = find_by_class(&page.root(), "tabs").unwrap();
        let cards = find_by_class(&page.root(), "cards").unwrap();

        // Decorate the container alone; the cards block never signals completion.
        let (decorated, report) = decorator.decorate_block(&page, tabs).await;
        assert!(decorated);
        let report = report.unwrap();
        assert_eq!(report.moved, 0);
        assert!(report.skipped[0].is_decoration_timeout());
        assert!(!contains(&find_by_class(&page.root(), "tabs").unwrap(), &cards));
    }

    #[tokio::test]
    async fn test_metadata_hidden_after_cross_section_move() {
        let decorator = Decorator::builder().build();
        let page = Page::parse(
            r#"<main>
                 <div class="section"><div class="accordion block">
                   <div><div>One</div><div>1</div></div>
                 </div></div>
                 <div class="section later">
                   <div class="metadata-wrapper"><div class="metadata block">
                     <div><div>parent</div><div>accordion</div></div>
                     <div><div>accordion-item</div><div>0</div></div>
                   </div></div>
                   <div class="default-content-wrapper"><p>moved text</p></div>
                 </div>
               </main>"#,
        );

        let report = decorator.decorate_page(&page).await;
        assert_eq!(report.moved(), 1);
        assert!(is_hidden(&find_by_class(&page.root(), "later").unwrap()));
        let accordion = find_by_class(&page.root(), "accordion").unwrap();
        let body = find_by_class(&accordion, "accordion-item-body").unwrap();
        assert!(find_by_class(&body, "default-content-wrapper").is_some());
        assert!(find_by_class(&body, "metadata-wrapper").is_none());
    }
}
