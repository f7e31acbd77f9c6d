use tracing::{info, warn};

use crate::config::Settings;
use crate::document::DocumentSource;
use crate::error::Result;
use crate::parser::{extract_surveyed, survey};
use crate::record::{FeedScan, ReadinessResult};

/// Waits for a feed to fill in before extracting from it.
///
/// Each tick snapshots the document and counts genuine items. Below the
/// threshold it scrolls, sleeps and tries again; at the attempt ceiling it
/// gives up and extracts whatever the last snapshot holds. One poller per
/// feed; all counters live on the stack of [`ReadinessPoller::run`].
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    settings: Settings,
}

enum Tick {
    Done(FeedScan),
    Pending,
}

impl ReadinessPoller {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run<D: DocumentSource>(&self, doc: &mut D) -> Result<FeedScan> {
        let cfg = &self.settings.poller;
        let mut attempts: u32 = 0;

        loop {
            // The snapshot and its node handles are confined to this block so
            // nothing from one tick survives into the next.
            let tick = {
                let snap = doc.snapshot().await?;
                let survey = survey(&snap, &self.settings)?;
                let tally = survey.tally;
                info!(
                    attempt = attempts,
                    genuine = tally.genuine,
                    placeholder = tally.placeholder,
                    comment = tally.comment,
                    skipped = tally.skipped,
                    "feed readiness tick"
                );

                let converged = tally.genuine >= cfg.genuine_threshold;
                if converged || attempts >= cfg.max_attempts {
                    if !converged {
                        warn!(
                            attempts,
                            genuine = tally.genuine,
                            threshold = cfg.genuine_threshold,
                            "feed never converged, extracting from last snapshot"
                        );
                    }
                    Tick::Done(FeedScan {
                        readiness: ReadinessResult {
                            converged,
                            genuine_count: tally.genuine,
                            attempts,
                        },
                        tally,
                        posts: extract_surveyed(&snap, &survey, &self.settings),
                    })
                } else {
                    Tick::Pending
                }
            };

            if let Tick::Done(scan) = tick {
                info!(
                    converged = scan.readiness.converged,
                    attempts = scan.readiness.attempts,
                    posts = scan.posts.len(),
                    "feed scan finished"
                );
                return Ok(scan);
            }

            doc.scroll_by(cfg.scroll_px).await?;
            doc.sleep(cfg.interval()).await;
            attempts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollerSettings;
    use crate::document::{HtmlSnapshot, ReplayDocument, Snapshot};
    use crate::error::{DocumentError, FeedError};

    use async_trait::async_trait;
    use scraper::ElementRef;

    const MEMBERS: &[&str] = &["Ana Silva", "Ben Carter", "Chloe Martin", "Dev Patel"];

    fn genuine_item(n: usize) -> String {
        let name = MEMBERS[(n - 1) % MEMBERS.len()];
        format!(
            r#"<div role="article" aria-label="Post by {name}, 1 hour ago">
                 <div dir="auto">Post number {n} from the neighbourhood group, with more than enough words in it to clear the genuine content threshold.</div>
                 <a href="/groups/1/posts/{n}/">1h</a>
               </div>"#
        )
    }

    fn placeholder_item() -> &'static str {
        r#"<div role="article"><div data-visualcompletion="loading-state"></div></div>"#
    }

    /// A page with `genuine` loaded posts followed by two still-loading slots.
    fn frame(genuine: usize) -> String {
        let posts: String = (1..=genuine).map(genuine_item).collect();
        format!(
            r#"<html><body><div role="feed">{posts}{p}{p}</div></body></html>"#,
            p = placeholder_item()
        )
    }

    fn settings(threshold: usize, max_attempts: u32) -> Settings {
        Settings {
            poller: PollerSettings {
                genuine_threshold: threshold,
                max_attempts,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn converges_once_threshold_reached() {
        let frames = [0, 1, 2, 3, 3, 3].iter().map(|&n| frame(n)).collect();
        let mut doc = ReplayDocument::from_frames(frames).unwrap();

        let scan = ReadinessPoller::new(settings(3, 30)).run(&mut doc).await.unwrap();

        assert_eq!(
            scan.readiness,
            ReadinessResult {
                converged: true,
                genuine_count: 3,
                attempts: 3
            }
        );
        assert_eq!(doc.scrolls(), 3);
        assert_eq!(scan.posts.len(), 3);
        assert_eq!(scan.tally.placeholder, 2);
        assert_eq!(
            scan.posts[2].record.author_name.as_deref(),
            Some("Chloe Martin")
        );
    }

    #[tokio::test]
    async fn already_ready_feed_never_scrolls() {
        let mut doc = ReplayDocument::from_frames(vec![frame(4)]).unwrap();
        let scan = ReadinessPoller::new(settings(3, 30)).run(&mut doc).await.unwrap();
        assert!(scan.readiness.converged);
        assert_eq!(scan.readiness.attempts, 0);
        assert_eq!(scan.readiness.genuine_count, 4);
        assert_eq!(doc.scrolls(), 0);
    }

    #[tokio::test]
    async fn exhausts_at_attempt_ceiling() {
        let frames = vec![frame(0), frame(1)];
        let mut doc = ReplayDocument::from_frames(frames).unwrap();

        let scan = ReadinessPoller::new(settings(3, 5)).run(&mut doc).await.unwrap();

        assert!(!scan.readiness.converged);
        assert_eq!(scan.readiness.attempts, 5);
        assert_eq!(scan.readiness.genuine_count, 1);
        assert_eq!(doc.scrolls(), 5);
        // Degraded, not empty: the last observation is still extracted.
        assert_eq!(scan.posts.len(), 1);
    }

    #[tokio::test]
    async fn scrolls_by_configured_amount() {
        let mut cfg = settings(2, 30);
        cfg.poller.scroll_px = 640;
        let mut doc = ReplayDocument::from_frames(vec![frame(0), frame(2)]).unwrap();
        ReadinessPoller::new(cfg).run(&mut doc).await.unwrap();
        assert_eq!(doc.scrolled_px(), 640);
    }

    /// Delegates to an HTML snapshot but reports any node marked
    /// `data-stale` as detached.
    struct FlakySnapshot(HtmlSnapshot);

    impl FlakySnapshot {
        fn check(&self, node: ElementRef<'_>) -> Result<(), DocumentError> {
            match node.value().attr("data-stale") {
                Some(_) => Err(DocumentError::Stale),
                None => Ok(()),
            }
        }
    }

    impl Snapshot for FlakySnapshot {
        type Node<'a> = ElementRef<'a>;

        fn query(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, DocumentError> {
            self.0.query(selector)
        }

        fn query_in<'a>(
            &'a self,
            scope: ElementRef<'a>,
            selector: &str,
        ) -> Result<Vec<ElementRef<'a>>, DocumentError> {
            self.check(scope)?;
            self.0.query_in(scope, selector)
        }

        fn attribute<'a>(
            &'a self,
            node: ElementRef<'a>,
            name: &str,
        ) -> Result<Option<String>, DocumentError> {
            self.check(node)?;
            self.0.attribute(node, name)
        }

        fn text<'a>(&'a self, node: ElementRef<'a>) -> Result<String, DocumentError> {
            self.check(node)?;
            self.0.text(node)
        }
    }

    struct FlakyDocument {
        html: String,
        scrolls: u32,
    }

    #[async_trait]
    impl DocumentSource for FlakyDocument {
        type Snapshot = FlakySnapshot;

        async fn snapshot(&mut self) -> Result<FlakySnapshot, DocumentError> {
            Ok(FlakySnapshot(HtmlSnapshot::parse(&self.html)))
        }

        async fn scroll_by(&mut self, _px: u32) -> Result<(), DocumentError> {
            self.scrolls += 1;
            Ok(())
        }

        async fn sleep(&mut self, _duration: std::time::Duration) {}
    }

    #[tokio::test]
    async fn unreadable_items_are_skipped_not_fatal() {
        let html = format!(
            r#"<div role="feed">{}<div role="article" data-stale="1">gone</div>{}</div>"#,
            genuine_item(1),
            genuine_item(2)
        );
        let mut doc = FlakyDocument { html, scrolls: 0 };

        let scan = ReadinessPoller::new(settings(2, 3)).run(&mut doc).await.unwrap();

        assert!(scan.readiness.converged);
        assert_eq!(scan.tally.skipped, 1);
        assert_eq!(scan.tally.genuine, 2);
        assert_eq!(scan.tally.placeholder, 0);
        assert_eq!(doc.scrolls, 0);
    }

    struct DeadDocument;

    #[async_trait]
    impl DocumentSource for DeadDocument {
        type Snapshot = HtmlSnapshot;

        async fn snapshot(&mut self) -> Result<HtmlSnapshot, DocumentError> {
            Err(DocumentError::Unavailable("renderer crashed".into()))
        }

        async fn scroll_by(&mut self, _px: u32) -> Result<(), DocumentError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unqueryable_document_is_fatal() {
        let err = ReadinessPoller::new(Settings::default())
            .run(&mut DeadDocument)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::Document(DocumentError::Unavailable(_))
        ));
    }
}
