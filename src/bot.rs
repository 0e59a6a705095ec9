use std::time::Duration;

use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{BotConfig, Selection};
use crate::gemini::{GeminiError, TextGenerator};
use crate::prompt::{accept_reply, build_prompt, with_disclaimer};
use crate::reddit::{Item, Platform, VoteDirection};
use crate::report::{CycleOutcome, CycleReport};
use crate::sentiment::{SentimentScorer, Tone};
use crate::tracker::DedupTracker;

/// Drives polling cycles: pick a subreddit, scan candidates, post at most one reply.
pub struct ReplyBot<P, G> {
    platform: P,
    /// `None` when a fixed reply is configured.
    generator: Option<G>,
    config: BotConfig,
    /// Next subreddit for round-robin selection.
    next_index: usize,
}

impl<P: Platform, G: TextGenerator> ReplyBot<P, G> {
    pub fn new(platform: P, generator: Option<G>, config: BotConfig) -> Self {
        Self {
            platform,
            generator,
            config,
            next_index: 0,
        }
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(&mut self, tracker: &mut DedupTracker, cancel: &CancellationToken) {
        info!(
            subreddits = ?self.config.subreddits,
            processed = tracker.len(),
            "bot starting"
        );
        while !cancel.is_cancelled() {
            let report = self.run_cycle(tracker, cancel).await;
            log_report(&report);

            debug!(
                "cycle finished, waiting {}s before next scan",
                self.config.poll_interval_secs
            );
            if !pause(self.config.poll_interval_secs, cancel).await {
                break;
            }
        }
        info!("bot stopped");
    }

    /// Run a single cycle against one subreddit.
    pub async fn run_cycle(
        &mut self,
        tracker: &mut DedupTracker,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let subreddit = self.select_subreddit();
        let report = CycleReport::start(&subreddit);
        let span = info_span!("cycle", cycle_id = %report.cycle_id, subreddit = %subreddit);
        self.scan(&subreddit, report, tracker, cancel)
            .instrument(span)
            .await
            .finish()
    }

    async fn scan(
        &self,
        subreddit: &str,
        mut report: CycleReport,
        tracker: &mut DedupTracker,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let items = match self
            .platform
            .fetch(subreddit, self.config.listing, self.config.item_limit)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "failed to fetch r/{subreddit}");
                report.outcome = CycleOutcome::FetchFailed;
                pause(self.config.error_backoff_secs, cancel).await;
                return report;
            }
        };

        for item in &items {
            if cancel.is_cancelled() {
                break;
            }
            report.scanned += 1;

            let key = item.dedup_key();
            if tracker.is_processed(&key) {
                report.already_processed += 1;
                continue;
            }

            let tone = match self.eligibility(item) {
                Ok(tone) => tone,
                Err(reason) => {
                    debug!(id = %item.id, reason, "skipping ineligible item");
                    report.ineligible += 1;
                    continue;
                }
            };

            info!(id = %item.id, title = %item.title, "found new candidate");
            let reply = match self.compose_reply(item, tone).await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    info!(id = %item.id, "no suitable reply generated");
                    report.no_suitable_reply += 1;
                    pause(self.config.candidate_pause_secs, cancel).await;
                    continue;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "text generator rate limited, backing off {}s",
                        self.config.ratelimit_backoff_secs
                    );
                    report.outcome = CycleOutcome::RateLimited;
                    pause(self.config.ratelimit_backoff_secs, cancel).await;
                    return report;
                }
            };

            match self.platform.reply(item, &reply).await {
                Ok(()) => {
                    info!(id = %item.id, "replied");
                    tracker.mark_processed(&key);
                    report.replied_to = Some(item.id.clone());
                    report.outcome = CycleOutcome::Replied;
                    if self.config.upvote {
                        self.upvote(item).await;
                    }
                    pause(self.config.post_reply_pause_secs, cancel).await;
                    return report;
                }
                Err(e) => {
                    let class = DedupTracker::classify(&e.signal());
                    warn!(id = %item.id, error = %e, classification = %class, "reply failed");
                    if !class.marks_processed() {
                        info!(
                            "rate limited, backing off {}s",
                            self.config.ratelimit_backoff_secs
                        );
                        report.outcome = CycleOutcome::RateLimited;
                        pause(self.config.ratelimit_backoff_secs, cancel).await;
                        return report;
                    }
                    tracker.mark_processed(&key);
                    report.skipped_after_failure += 1;
                }
            }

            pause(self.config.candidate_pause_secs, cancel).await;
        }

        report
    }

    /// Pick the subreddit for this cycle.
    fn select_subreddit(&mut self) -> String {
        let subs: Vec<&String> = self
            .config
            .subreddits
            .iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if subs.is_empty() {
            return String::new();
        }
        match self.config.selection {
            Selection::Random => subs
                .choose(&mut rand::thread_rng())
                .map(|s| s.to_string())
                .unwrap_or_default(),
            Selection::RoundRobin => {
                let sub = subs[self.next_index % subs.len()].to_string();
                self.next_index = (self.next_index + 1) % subs.len();
                sub
            }
        }
    }

    /// Ok with the item's tone (when sentiment is enabled) or the reason to skip it.
    fn eligibility(&self, item: &Item) -> Result<Option<Tone>, &'static str> {
        if item.is_authored_by(&self.config.reddit.username) {
            return Err("own item");
        }
        if item.locked || item.archived {
            return Err("locked or archived");
        }
        if item.stickied {
            return Err("stickied");
        }
        if !self.config.sentiment.enabled {
            return Ok(None);
        }

        let (score, tone) = SentimentScorer::analyse(&item.title, &item.body);
        debug!(id = %item.id, score, %tone, "sentiment");
        match self.config.sentiment.min_score {
            Some(min) if score < min => Err("sentiment below threshold"),
            _ => Ok(Some(tone)),
        }
    }

    /// Build the reply body, or `None` when nothing usable came back.
    /// Only a generator rate limit is returned as an error.
    async fn compose_reply(
        &self,
        item: &Item,
        tone: Option<Tone>,
    ) -> Result<Option<String>, GeminiError> {
        if let Some(fixed) = &self.config.fixed_reply {
            return Ok(Some(fixed.clone()));
        }
        let Some(generator) = self.generator.as_ref() else {
            return Ok(None);
        };

        let prompt = build_prompt(self.config.persona, item, tone);
        match generator.generate(&prompt).await {
            Ok(text) => Ok(accept_reply(&text, &self.config.reject_markers)
                .map(|reply| with_disclaimer(&reply, &self.config.disclaimer))),
            Err(e @ GeminiError::RateLimited { .. }) => Err(e),
            Err(e) => {
                warn!(id = %item.id, error = %e, "text generation failed");
                Ok(None)
            }
        }
    }

    async fn upvote(&self, item: &Item) {
        if let Err(e) = self.platform.vote(item, VoteDirection::Up).await {
            let class = DedupTracker::classify(&e.signal());
            warn!(id = %item.id, error = %e, classification = %class, "upvote failed");
        }
    }
}

/// Sleep for `secs` unless cancelled first. Returns `false` on cancellation.
async fn pause(secs: u64, cancel: &CancellationToken) -> bool {
    if secs == 0 {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(Duration::from_secs(secs)) => true,
    }
}

fn log_report(report: &CycleReport) {
    info!(
        cycle_id = %report.cycle_id,
        subreddit = %report.subreddit,
        outcome = %report.outcome,
        scanned = report.scanned,
        already_processed = report.already_processed,
        ineligible = report.ineligible,
        replied_to = report.replied_to.as_deref().unwrap_or("-"),
        duration_ms = report.duration_ms,
        "cycle complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    use crate::reddit::types::ApiErrorEntry;
    use crate::reddit::{ItemKind, Listing, RedditError};

    #[derive(Default)]
    struct MockPlatform {
        items: Vec<Item>,
        fetch_fails: bool,
        /// Error code returned when replying to the given id.
        reply_failures: HashMap<String, &'static str>,
        replies: RefCell<Vec<(String, String)>>,
        votes: RefCell<Vec<String>>,
    }

    impl MockPlatform {
        fn with_items(items: Vec<Item>) -> Self {
            Self {
                items,
                ..Default::default()
            }
        }

        fn failing(mut self, id: &str, code: &'static str) -> Self {
            self.reply_failures.insert(id.to_string(), code);
            self
        }

        fn replied_ids(&self) -> Vec<String> {
            self.replies.borrow().iter().map(|(id, _)| id.clone()).collect()
        }
    }

    impl Platform for MockPlatform {
        async fn fetch(
            &self,
            _subreddit: &str,
            _listing: Listing,
            limit: u32,
        ) -> Result<Vec<Item>, RedditError> {
            if self.fetch_fails {
                return Err(RedditError::Status {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self.items.iter().take(limit as usize).cloned().collect())
        }

        async fn reply(&self, item: &Item, body: &str) -> Result<(), RedditError> {
            self.replies
                .borrow_mut()
                .push((item.id.clone(), body.to_string()));
            match self.reply_failures.get(&item.id) {
                None => Ok(()),
                Some(&"RATELIMIT") => Err(RedditError::RateLimited {
                    retry_after_secs: 60,
                }),
                Some(code) => Err(RedditError::Api {
                    errors: vec![ApiErrorEntry {
                        code: code.to_string(),
                        message: "mock".into(),
                    }],
                }),
            }
        }

        async fn vote(&self, item: &Item, _direction: VoteDirection) -> Result<(), RedditError> {
            self.votes.borrow_mut().push(item.id.clone());
            Ok(())
        }
    }

    struct MockGenerator {
        response: Result<String, u16>,
        prompts: RefCell<Vec<String>>,
    }

    impl MockGenerator {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn err() -> Self {
            Self::failing_with(500)
        }

        fn failing_with(status: u16) -> Self {
            Self {
                response: Err(status),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for MockGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(429) => Err(GeminiError::RateLimited {
                    retry_after_secs: 30,
                }),
                Err(status) => Err(GeminiError::ApiError {
                    status: *status,
                    message: "mock error".into(),
                }),
            }
        }
    }

    fn post(id: &str) -> Item {
        Item {
            id: id.into(),
            kind: ItemKind::Post,
            subreddit: "testingground4bots".into(),
            author: Some("someone".into()),
            title: format!("Post {id}"),
            body: String::new(),
            locked: false,
            archived: false,
            stickied: false,
        }
    }

    fn config() -> BotConfig {
        let mut config = BotConfig::default();
        config.reddit.username = "gas_bot".into();
        config.subreddits = vec!["testingground4bots".into()];
        config.poll_interval_secs = 0;
        config.ratelimit_backoff_secs = 0;
        config.error_backoff_secs = 0;
        config.post_reply_pause_secs = 0;
        config.candidate_pause_secs = 0;
        config.disclaimer = String::new();
        config
    }

    fn tracker() -> (tempfile::TempDir, DedupTracker) {
        let dir = tempfile::tempdir().unwrap();
        let tracker = DedupTracker::load(dir.path().join("processed.txt"));
        (dir, tracker)
    }

    #[tokio::test]
    async fn new_item_is_replied_and_recorded() {
        let (dir, mut tracker) = tracker();
        let platform = MockPlatform::with_items(vec![post("abc123")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("Nice one!")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.outcome, CycleOutcome::Replied);
        assert_eq!(report.replied_to.as_deref(), Some("abc123"));
        assert!(tracker.is_processed("abc123"));
        let stored = std::fs::read_to_string(dir.path().join("processed.txt")).unwrap();
        assert!(stored.lines().any(|l| l == "abc123"));
        assert_eq!(bot.platform.replies.borrow()[0].1, "Nice one!");
    }

    #[tokio::test]
    async fn processed_item_is_skipped_without_remote_action() {
        let (_dir, mut tracker) = tracker();
        tracker.mark_processed("seen1");
        let platform = MockPlatform::with_items(vec![post("seen1")]);
        let generator = MockGenerator::ok("hello");
        let mut bot = ReplyBot::new(platform, Some(generator), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.already_processed, 1);
        assert_eq!(report.outcome, CycleOutcome::NoReply);
        assert!(bot.platform.replies.borrow().is_empty());
        assert!(bot.generator.as_ref().unwrap().prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn comment_sharing_a_post_id_is_still_eligible() {
        let (dir, mut tracker) = tracker();
        tracker.mark_processed("abc123");
        let mut comment = post("abc123");
        comment.kind = ItemKind::Comment;
        let platform = MockPlatform::with_items(vec![comment]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.already_processed, 0);
        assert_eq!(report.outcome, CycleOutcome::Replied);
        assert!(tracker.is_processed("t1_abc123"));
        let stored = std::fs::read_to_string(dir.path().join("processed.txt")).unwrap();
        assert_eq!(stored, "abc123\nt1_abc123\n");
    }

    #[tokio::test]
    async fn only_one_reply_per_cycle() {
        let (_dir, mut tracker) = tracker();
        let platform = MockPlatform::with_items(vec![post("a1"), post("a2"), post("a3")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.scanned, 1);
        assert_eq!(bot.platform.replied_ids(), vec!["a1"]);
        assert!(!tracker.is_processed("a2"));

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(report.already_processed, 1);
        assert_eq!(report.replied_to.as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn rate_limit_leaves_item_unprocessed_and_ends_cycle() {
        let (_dir, mut tracker) = tracker();
        let platform =
            MockPlatform::with_items(vec![post("r1"), post("r2")]).failing("r1", "RATELIMIT");
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.outcome, CycleOutcome::RateLimited);
        assert!(!tracker.is_processed("r1"));
        assert_eq!(bot.platform.replied_ids(), vec!["r1"]);
    }

    #[tokio::test]
    async fn permanent_failure_marks_and_moves_on() {
        let (_dir, mut tracker) = tracker();
        let platform =
            MockPlatform::with_items(vec![post("old1"), post("ok2")]).failing("old1", "TOO_OLD");
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert!(tracker.is_processed("old1"));
        assert_eq!(report.skipped_after_failure, 1);
        assert_eq!(report.replied_to.as_deref(), Some("ok2"));
    }

    #[tokio::test]
    async fn unknown_failure_is_treated_as_permanent() {
        let (_dir, mut tracker) = tracker();
        let platform =
            MockPlatform::with_items(vec![post("u1")]).failing("u1", "SOME_NEW_UNSEEN_CODE");
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert!(tracker.is_processed("u1"));
        assert_eq!(report.outcome, CycleOutcome::NoReply);

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(report.already_processed, 1);
        assert_eq!(bot.platform.replied_ids().len(), 1);
    }

    #[tokio::test]
    async fn own_locked_and_stickied_items_are_ineligible() {
        let (_dir, mut tracker) = tracker();
        let mut own = post("own");
        own.author = Some("GAS_BOT".into());
        let mut locked = post("locked");
        locked.locked = true;
        let mut archived = post("archived");
        archived.archived = true;
        let mut sticky = post("sticky");
        sticky.stickied = true;
        let platform = MockPlatform::with_items(vec![own, locked, archived, sticky]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.ineligible, 4);
        assert!(bot.platform.replies.borrow().is_empty());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn unusable_generation_is_not_marked() {
        let (_dir, mut tracker) = tracker();
        let platform = MockPlatform::with_items(vec![post("g1"), post("g2")]);
        let mut bot = ReplyBot::new(
            platform,
            Some(MockGenerator::ok("Sorry, I am unable to generate a response.")),
            config(),
        );

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.no_suitable_reply, 2);
        assert!(tracker.is_empty());
        assert!(bot.platform.replies.borrow().is_empty());
    }

    #[tokio::test]
    async fn generator_error_is_not_marked() {
        let (_dir, mut tracker) = tracker();
        let platform = MockPlatform::with_items(vec![post("e1")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::err()), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(report.no_suitable_reply, 1);
        assert!(!tracker.is_processed("e1"));
    }

    #[tokio::test]
    async fn generator_rate_limit_ends_cycle() {
        let (_dir, mut tracker) = tracker();
        let platform = MockPlatform::with_items(vec![post("q1"), post("q2"), post("q3")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::failing_with(429)), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(report.outcome, CycleOutcome::RateLimited);
        assert_eq!(report.scanned, 1);
        assert_eq!(bot.generator.as_ref().unwrap().prompts.borrow().len(), 1);
        assert!(tracker.is_empty());
        assert!(bot.platform.replies.borrow().is_empty());
    }

    #[tokio::test]
    async fn fixed_reply_skips_generator() {
        let (_dir, mut tracker) = tracker();
        let mut config = config();
        config.fixed_reply = Some("All gas, no brakes!".into());
        let platform = MockPlatform::with_items(vec![post("f1")]);
        let mut bot: ReplyBot<_, MockGenerator> = ReplyBot::new(platform, None, config);

        bot.run_cycle(&mut tracker, &CancellationToken::new()).await;

        assert_eq!(bot.platform.replies.borrow()[0].1, "All gas, no brakes!");
        assert!(tracker.is_processed("f1"));
    }

    #[tokio::test]
    async fn disclaimer_is_appended_to_generated_reply() {
        let (_dir, mut tracker) = tracker();
        let mut config = config();
        config.disclaimer = "\n\n*bot*".into();
        let platform = MockPlatform::with_items(vec![post("d1")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("  hi  ")), config);

        bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(bot.platform.replies.borrow()[0].1, "hi\n\n*bot*");
    }

    #[tokio::test]
    async fn fetch_failure_reports_and_marks_nothing() {
        let (_dir, mut tracker) = tracker();
        let platform = MockPlatform {
            items: vec![post("x")],
            fetch_fails: true,
            ..Default::default()
        };
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config());

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(report.outcome, CycleOutcome::FetchFailed);
        assert_eq!(report.scanned, 0);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn upvote_after_reply_when_enabled() {
        let (_dir, mut tracker) = tracker();
        let mut config = config();
        config.upvote = true;
        let platform = MockPlatform::with_items(vec![post("v1")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config);

        bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(*bot.platform.votes.borrow(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn sentiment_threshold_skips_gloomy_posts() {
        let (_dir, mut tracker) = tracker();
        let mut config = config();
        config.sentiment.enabled = true;
        config.sentiment.min_score = Some(-2);
        let mut gloomy = post("sad1");
        gloomy.title = "Worst week, I hate everything".into();
        let platform = MockPlatform::with_items(vec![gloomy, post("calm")]);
        let mut bot = ReplyBot::new(platform, Some(MockGenerator::ok("hey")), config);

        let report = bot.run_cycle(&mut tracker, &CancellationToken::new()).await;
        assert_eq!(report.ineligible, 1);
        assert_eq!(report.replied_to.as_deref(), Some("calm"));
        assert!(!tracker.is_processed("sad1"));
    }

    #[tokio::test]
    async fn round_robin_cycles_through_subreddits() {
        let mut config = config();
        config.selection = Selection::RoundRobin;
        config.subreddits = vec!["a".into(), " ".into(), "b".into()];
        let mut bot: ReplyBot<_, MockGenerator> =
            ReplyBot::new(MockPlatform::default(), None, config);

        assert_eq!(bot.select_subreddit(), "a");
        assert_eq!(bot.select_subreddit(), "b");
        assert_eq!(bot.select_subreddit(), "a");
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let (_dir, mut tracker) = tracker();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut bot = ReplyBot::new(
            MockPlatform::with_items(vec![post("z")]),
            Some(MockGenerator::ok("hey")),
            config(),
        );

        bot.run(&mut tracker, &cancel).await;
        assert!(bot.platform.replies.borrow().is_empty());
    }
}
