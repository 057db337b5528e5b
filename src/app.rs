use eframe::egui;
use egui::{CornerRadius, RichText, ScrollArea, Stroke, Ui};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::cache::PageCache;
use crate::config::AppConfig;
use crate::feed::{Completion, Feed, NextPage, PageRequest};
use crate::grouping::{compute_groups, preview, PREVIEW_CHARS};
use crate::interstitial::BreakRotation;
use crate::models::{DisplayGroup, GroupSize, Post, PostFilter, Strategy, TabcoinsUpdate, UserProfile};
use crate::settings::{Settings, SettingsStore};
use crate::tabnews_client::{ApiError, TabNewsClient};
use crate::theme::AppTheme;
use crate::view_state::{BackOutcome, FeedDisplay, TailState, ViewState};

const FLASH_FOR: Duration = Duration::from_secs(4);
const ACTION_BAR_HEIGHT: f32 = 40.0;

/// Room left for the post body and comments above the action bar.
fn detail_scroll_height(available: f32) -> f32 {
    (available - ACTION_BAR_HEIGHT).max(0.0)
}

/// Results coming back from the network tasks.
enum AppEvent {
    Page {
        request: PageRequest,
        result: Result<Vec<Post>, ApiError>,
    },
    FullPost {
        post_id: String,
        result: Result<Post, ApiError>,
    },
    Comments {
        post_id: String,
        result: Result<Vec<Post>, ApiError>,
    },
    Author {
        post_id: String,
        result: Result<UserProfile, ApiError>,
    },
    Upvoted {
        post_id: String,
        result: Result<TabcoinsUpdate, ApiError>,
    },
}

enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> Loadable<T> {
    fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => Loadable::Failed(err),
        }
    }
}

struct DetailState {
    post_id: String,
    full_post: Loadable<Post>,
    comments: Loadable<Vec<Post>>,
    author: Loadable<UserProfile>,
    tabcoins: i64,
}

enum FeedAction {
    Open(Post),
    DismissBreak,
    Retry,
}

enum DetailAction {
    Upvote,
    OpenInBrowser,
    CopyLink,
}

pub struct TabTokApp {
    config: AppConfig,
    client: TabNewsClient,
    runtime: Arc<Runtime>,
    settings_store: SettingsStore,
    settings: Settings,
    theme: AppTheme,
    feed: Feed,
    view: ViewState,
    rotation: BreakRotation,
    filter: PostFilter,
    groups: Vec<DisplayGroup>,
    groups_dirty: bool,
    detail: Option<DetailState>,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    show_settings: bool,
    flash: Option<(String, Instant)>,
}

impl TabTokApp {
    pub fn new(
        config: AppConfig,
        client: TabNewsClient,
        runtime: Arc<Runtime>,
        settings_store: SettingsStore,
        settings: Settings,
    ) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            config,
            client,
            runtime,
            settings_store,
            theme: AppTheme::for_choice(settings.theme),
            feed: Feed::new(settings.strategy, PageCache::default()),
            settings,
            view: ViewState::new(),
            rotation: BreakRotation::default(),
            filter: PostFilter::All,
            groups: Vec::new(),
            groups_dirty: false,
            detail: None,
            events_tx,
            events_rx,
            show_settings: false,
            flash: None,
        }
    }

    fn dispatch_page(&self, ctx: &egui::Context, request: PageRequest) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = request.run(&client).await;
            let _ = tx.send(AppEvent::Page { request, result });
            ctx.request_repaint();
        });
    }

    fn drive(&mut self, ctx: &egui::Context, next: NextPage) {
        match next {
            NextPage::Fetch(request) => self.dispatch_page(ctx, request),
            NextPage::Served(page) => {
                debug!(page, "page appended from cache");
                self.groups_dirty = true;
                // Nothing else will wake the UI, and the sentinel may still be visible
                ctx.request_repaint();
            }
            NextPage::InFlight | NextPage::Exhausted | NextPage::AwaitingRetry => {}
        }
    }

    /// Kicks off page 1 when the feed has never been asked for anything.
    fn ensure_started(&mut self, ctx: &egui::Context) {
        if self.feed.pages_loaded() == 0
            && !self.feed.is_fetching()
            && self.feed.has_more()
            && matches!(FeedDisplay::of(&self.feed), FeedDisplay::InitialLoading)
        {
            let next = self.feed.next_page();
            self.drive(ctx, next);
        }
    }

    fn refresh(&mut self, ctx: &egui::Context) {
        if let Some(request) = self.feed.refresh() {
            self.dispatch_page(ctx, request);
            self.groups_dirty = true;
        }
    }

    fn retry(&mut self, ctx: &egui::Context) {
        let next = self.feed.retry();
        self.drive(ctx, next);
    }

    fn switch_strategy(&mut self, ctx: &egui::Context, strategy: Strategy) {
        let Some(next) = self.feed.set_strategy(strategy) else {
            return;
        };
        self.drive(ctx, next);
        self.groups_dirty = true;
        self.settings.strategy = strategy;
        if let Err(e) = self.settings_store.set_strategy(strategy) {
            warn!(error = %e, "failed to save strategy");
        }
    }

    fn set_group_size(&mut self, size: GroupSize) {
        if self.settings.posts_per_group == size {
            return;
        }
        self.settings.posts_per_group = size;
        self.groups_dirty = true;
        if let Err(e) = self.settings_store.set_posts_per_group(size) {
            warn!(error = %e, "failed to save posts per group");
        }
    }

    fn toggle_theme(&mut self) {
        self.settings.theme = self.settings.theme.toggled();
        self.theme = AppTheme::for_choice(self.settings.theme);
        if let Err(e) = self.settings_store.set_theme(self.settings.theme) {
            warn!(error = %e, "failed to save theme");
        }
    }

    fn show_flash(&mut self, message: impl Into<String>) {
        self.flash = Some((message.into(), Instant::now()));
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Page { request, result } => match self.feed.complete(request, result) {
                    Completion::Applied { .. } => self.groups_dirty = true,
                    Completion::Failed(err) => {
                        if err == ApiError::RateLimited {
                            self.show_flash(err.to_string());
                        }
                    }
                    Completion::Stale => {}
                },
                AppEvent::FullPost { post_id, result } => {
                    if let Some(detail) = self.detail_for(&post_id) {
                        if let Ok(post) = &result {
                            detail.tabcoins = post.tabcoins;
                        }
                        detail.full_post = Loadable::from_result(result);
                    }
                }
                AppEvent::Comments { post_id, result } => {
                    if let Some(detail) = self.detail_for(&post_id) {
                        detail.comments = Loadable::from_result(result);
                    }
                }
                AppEvent::Author { post_id, result } => {
                    if let Some(detail) = self.detail_for(&post_id) {
                        detail.author = Loadable::from_result(result);
                    }
                }
                AppEvent::Upvoted { post_id, result } => match result {
                    Ok(update) => {
                        if let Some(detail) = self.detail_for(&post_id) {
                            detail.tabcoins = update.tabcoins;
                        }
                        self.show_flash("Upvoted");
                    }
                    Err(err) => {
                        warn!(post = %post_id, error = %err, "upvote failed");
                        self.show_flash(format!("Upvote failed: {}", err));
                    }
                },
            }
        }
    }

    /// The open detail view, if it still belongs to `post_id`.
    fn detail_for(&mut self, post_id: &str) -> Option<&mut DetailState> {
        self.detail.as_mut().filter(|detail| detail.post_id == post_id)
    }

    fn recompute_groups(&mut self) {
        if !self.groups_dirty {
            return;
        }
        self.groups = compute_groups(self.feed.posts(), self.filter, self.settings.posts_per_group);
        self.rotation.observe_loaded(self.feed.posts().len());
        self.groups_dirty = false;
    }

    fn open_post(&mut self, ctx: &egui::Context, post: Post) {
        info!(post = %post.id, "opening post");
        self.detail = Some(DetailState {
            post_id: post.id.clone(),
            full_post: Loadable::Loading,
            comments: Loadable::Loading,
            author: Loadable::Loading,
            tabcoins: post.tabcoins,
        });

        let username = post.owner_username.clone();
        let slug = post.slug.clone();
        let post_id = post.id.clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let repaint = ctx.clone();
        // Body first, then comments, on one task
        self.runtime.spawn(async move {
            let result = client.fetch_post(&username, &slug).await;
            let _ = tx.send(AppEvent::FullPost { post_id: post_id.clone(), result });
            repaint.request_repaint();

            let result = client.fetch_comments(&username, &slug).await;
            let _ = tx.send(AppEvent::Comments { post_id: post_id.clone(), result });
            repaint.request_repaint();
        });

        // Author profile on its own task
        let username = post.owner_username.clone();
        let post_id = post.id.clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let repaint = ctx.clone();
        self.runtime.spawn(async move {
            let result = client.fetch_user(&username).await;
            let _ = tx.send(AppEvent::Author { post_id, result });
            repaint.request_repaint();
        });

        self.view.open(post);
    }

    fn close_post(&mut self) {
        self.view.close();
        self.detail = None;
    }

    fn go_back(&mut self) {
        match self.view.on_back() {
            BackOutcome::ClosedDetail => self.detail = None,
            BackOutcome::Absorbed => debug!("back consumed a leftover history entry"),
            BackOutcome::Propagate => debug!("back pressed on the feed, nothing to close"),
        }
    }

    fn upvote(&mut self, ctx: &egui::Context, post: &Post) {
        if !self.client.can_upvote() {
            self.show_flash("Set TABTOK_TOKEN to upvote posts");
            return;
        }
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let repaint = ctx.clone();
        let slug = post.slug.clone();
        let post_id = post.id.clone();
        self.runtime.spawn(async move {
            let result = client.upvote(&slug).await;
            let _ = tx.send(AppEvent::Upvoted { post_id, result });
            repaint.request_repaint();
        });
    }

    fn open_link(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(url, error = %e, "failed to open URL");
            self.show_flash("Could not open the browser");
        }
    }

    fn copy_link(&mut self, url: &str) {
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.to_string()));
        match copied {
            Ok(()) => self.show_flash("Link copied"),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                self.show_flash("Could not copy the link");
            }
        }
    }

    fn process_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let (back, refresh) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape)
                    || i.pointer.button_pressed(egui::PointerButton::Extra1)
                    || (i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft)),
                i.key_pressed(egui::Key::F5),
            )
        });

        if back {
            self.go_back();
        }
        if refresh {
            self.refresh(ctx);
        }
    }

    fn render_header(&mut self, ctx: &egui::Context, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("TabTok").size(20.0).strong().color(self.theme.highlight));
            ui.add_space(12.0);

            // Strategy tabs
            for strategy in Strategy::ALL {
                let selected = self.feed.strategy() == strategy;
                if ui.selectable_label(selected, strategy.label()).clicked() {
                    self.switch_strategy(ctx, strategy);
                }
            }

            ui.separator();

            // The filter only lives for this session
            let before = self.filter;
            egui::ComboBox::from_id_salt("post_filter")
                .selected_text(self.filter.label())
                .show_ui(ui, |ui| {
                    for filter in PostFilter::ALL {
                        ui.selectable_value(&mut self.filter, filter, filter.label());
                    }
                });
            if self.filter != before {
                self.groups_dirty = true;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙").on_hover_text("Settings").clicked() {
                    self.show_settings = !self.show_settings;
                }
                if ui.button("⟳").on_hover_text("Refresh (F5)").clicked() {
                    self.refresh(ctx);
                }
                if let Some((message, _)) = &self.flash {
                    ui.label(RichText::new(message).color(self.theme.secondary_text));
                }
            });
        });
    }

    fn render_settings(&mut self, ui: &mut Ui) {
        ui.heading("Settings");
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            ui.label("Theme");
            let label = match self.settings.theme.toggled() {
                crate::settings::ThemeChoice::Light => "☀ Light",
                crate::settings::ThemeChoice::Dark => "🌙 Dark",
            };
            if ui.button(label).clicked() {
                self.toggle_theme();
            }
        });

        ui.add_space(8.0);
        ui.label("Posts per row");
        ui.horizontal(|ui| {
            for n in GroupSize::MIN..=GroupSize::MAX {
                let Some(size) = GroupSize::new(n) else { continue };
                let selected = self.settings.posts_per_group == size;
                if ui.selectable_label(selected, n.to_string()).clicked() {
                    self.set_group_size(size);
                }
            }
        });

        ui.add_space(12.0);
        let token_note = if self.client.can_upvote() {
            "Upvotes enabled"
        } else {
            "Upvotes disabled (TABTOK_TOKEN not set)"
        };
        ui.label(RichText::new(token_note).color(self.theme.secondary_text).size(12.0));
    }

    fn render_card(&self, ui: &mut Ui, post: &Post) -> bool {
        let response = egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("@{}", post.owner_username)).strong().color(self.theme.text));
                    ui.label(RichText::new(post.published_label()).size(12.0).color(self.theme.secondary_text));
                });
                ui.add_space(4.0);
                ui.add(egui::Label::new(
                    RichText::new(post.title_text()).size(16.0).strong().color(self.theme.text),
                ).wrap());

                let body = preview(post.body_text(), PREVIEW_CHARS);
                if !body.is_empty() {
                    ui.add(egui::Label::new(RichText::new(body).color(self.theme.secondary_text)).wrap());
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("♥ {}", post.tabcoins)).color(self.theme.secondary_text));
                    ui.add_space(12.0);
                    ui.label(RichText::new(format!("💬 {}", post.children_deep_count)).color(self.theme.secondary_text));
                });
            })
            .response
            .interact(egui::Sense::click());

        if response.hovered() {
            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
        }
        response.clicked()
    }

    fn render_break(&self, ui: &mut Ui) -> bool {
        let Some(message) = self.rotation.current() else {
            return false;
        };

        let mut dismissed = false;
        egui::Frame::new()
            .fill(self.theme.break_background)
            .corner_radius(CornerRadius::same(8))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("☕ @TabTok").strong().color(self.theme.break_text));
                    ui.label(RichText::new("Break time!").size(12.0).color(self.theme.break_text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.small_button("✕").on_hover_text("Dismiss").clicked();
                    });
                });
                ui.add_space(4.0);
                ui.add(egui::Label::new(RichText::new(message).size(16.0).strong().color(self.theme.break_text)).wrap());
                ui.label(
                    RichText::new("Stretch, drink some water and come back when you're ready.")
                        .color(self.theme.break_text),
                );
            });
        dismissed
    }

    fn render_feed(&self, ui: &mut Ui, tail: &TailState) -> (Vec<FeedAction>, bool) {
        let mut actions = Vec::new();

        let sentinel_visible = ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                if self.groups.is_empty() && !self.feed.posts().is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(
                            RichText::new(format!("No posts match the '{}' filter yet.", self.filter.label()))
                                .color(self.theme.secondary_text)
                                .italics(),
                        );
                    });
                }

                for group in &self.groups {
                    match group {
                        DisplayGroup::Posts(posts) => {
                            ui.columns(posts.len(), |columns| {
                                for (column, post) in columns.iter_mut().zip(posts) {
                                    if self.render_card(column, post) {
                                        actions.push(FeedAction::Open(post.clone()));
                                    }
                                }
                            });
                        }
                        DisplayGroup::Interstitial => {
                            if self.render_break(ui) {
                                actions.push(FeedAction::DismissBreak);
                            }
                        }
                    }
                    ui.add_space(8.0);
                }

                // Tail row under the last group
                ui.add_space(10.0);
                ui.vertical_centered(|ui| match tail {
                    TailState::Loading => {
                        ui.spinner();
                        ui.label(RichText::new("Loading more posts...").color(self.theme.secondary_text));
                    }
                    TailState::Failed(err) => {
                        ui.label(RichText::new(err.to_string()).color(self.theme.error_text).size(13.0));
                        if ui.button("Retry").clicked() {
                            actions.push(FeedAction::Retry);
                        }
                    }
                    TailState::More => {}
                    TailState::End => {
                        ui.label(RichText::new("You reached the end.").color(self.theme.secondary_text));
                    }
                });

                // Empty marker row; seeing it asks for the next page
                let (sentinel, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 10.0), egui::Sense::hover());
                ui.add_space(20.0);
                ui.is_rect_visible(sentinel)
            })
            .inner;

        (actions, sentinel_visible)
    }

    fn render_detail(&self, ui: &mut Ui, post: &Post) -> Vec<DetailAction> {
        let mut actions = Vec::new();
        let Some(detail) = &self.detail else {
            return actions;
        };

        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("@{}", post.owner_username)).strong());
            ui.label(RichText::new(post.published_label()).color(self.theme.secondary_text));
            match &detail.author {
                Loadable::Ready(profile) => {
                    ui.label(
                        RichText::new(format!("{} tabcoins · {} tabcash", profile.tabcoins, profile.tabcash))
                            .size(12.0)
                            .color(self.theme.secondary_text),
                    );
                }
                Loadable::Loading => {
                    ui.spinner();
                }
                Loadable::Failed(_) => {}
            }
        });
        ui.separator();

        ScrollArea::vertical().auto_shrink([false; 2]).max_height(detail_scroll_height(ui.available_height())).show(ui, |ui| {
            match &detail.full_post {
                Loadable::Loading => {
                    ui.vertical_centered(|ui| ui.spinner());
                }
                Loadable::Ready(full) => {
                    ui.heading(full.title_text());
                    ui.add_space(8.0);
                    ui.add(egui::Label::new(full.body_text()).wrap());
                }
                Loadable::Failed(err) => {
                    ui.label(RichText::new(format!("Could not load the post: {}", err)).color(self.theme.error_text));
                }
            }

            ui.add_space(12.0);
            ui.separator();
            ui.label(RichText::new(format!("Comments ({})", post.children_deep_count)).strong().size(16.0));

            match &detail.comments {
                Loadable::Loading => {
                    ui.vertical_centered(|ui| ui.spinner());
                }
                Loadable::Ready(comments) if comments.is_empty() => {
                    ui.label(RichText::new("No comments yet").color(self.theme.secondary_text));
                }
                Loadable::Ready(comments) => {
                    for comment in comments {
                        egui::Frame::new()
                            .fill(self.theme.background)
                            .corner_radius(CornerRadius::same(6))
                            .inner_margin(10.0)
                            .outer_margin(egui::vec2(0.0, 4.0))
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.label(RichText::new(format!("@{}", comment.owner_username)).strong());
                                    ui.label(
                                        RichText::new(comment.published_label())
                                            .size(12.0)
                                            .color(self.theme.secondary_text),
                                    );
                                });
                                ui.add(egui::Label::new(comment.body_text()).wrap());
                            });
                    }
                }
                Loadable::Failed(err) => {
                    ui.label(RichText::new(format!("Could not load comments: {}", err)).color(self.theme.error_text));
                }
            }
        });

        // Action bar
        ui.separator();
        ui.horizontal(|ui| {
            let upvote = ui.add_enabled(self.client.can_upvote(), egui::Button::new(format!("♥ {}", detail.tabcoins)));
            if upvote.clicked() {
                actions.push(DetailAction::Upvote);
            }
            ui.label(format!("💬 {}", post.children_deep_count));
            if ui.button("Open in browser").clicked() {
                actions.push(DetailAction::OpenInBrowser);
            }
            if ui.button("Copy link").clicked() {
                actions.push(DetailAction::CopyLink);
            }
        });

        actions
    }
}

impl eframe::App for TabTokApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        // Apply whatever the network tasks finished since the last frame
        self.drain_events();
        self.process_keyboard_shortcuts(ctx);
        self.ensure_started(ctx);
        self.recompute_groups();

        // Expire the status message
        if let Some((_, shown_at)) = &self.flash {
            if shown_at.elapsed() >= FLASH_FOR {
                self.flash = None;
            } else {
                ctx.request_repaint_after(FLASH_FOR);
            }
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_header(ctx, ui);
            ui.add_space(4.0);
        });

        if self.show_settings {
            egui::SidePanel::right("settings_panel")
                .resizable(false)
                .default_width(220.0)
                .show(ctx, |ui| self.render_settings(ui));
        }

        // Main feed area
        let mut actions = Vec::new();
        let mut sentinel_visible = false;
        egui::CentralPanel::default().show(ctx, |ui| match FeedDisplay::of(&self.feed) {
            FeedDisplay::InitialLoading => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            FeedDisplay::InitialError(err) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() / 3.0);
                    ui.label(
                        RichText::new("Could not load posts.")
                            .size(20.0)
                            .color(self.theme.error_text),
                    );
                    ui.label(RichText::new(err.to_string()).color(self.theme.secondary_text));
                    ui.add_space(8.0);
                    if ui.button("Try again").clicked() {
                        actions.push(FeedAction::Retry);
                    }
                });
            }
            FeedDisplay::Content(tail) => {
                let (feed_actions, visible) = self.render_feed(ui, &tail);
                actions = feed_actions;
                sentinel_visible = visible;
            }
        });

        // Apply the clicks collected while drawing
        for action in actions {
            match action {
                FeedAction::Open(post) => self.open_post(ctx, post),
                FeedAction::DismissBreak => self.rotation.dismiss(),
                FeedAction::Retry => self.retry(ctx),
            }
        }

        if let Some(next) = self.view.on_proximity(sentinel_visible, &mut self.feed) {
            self.drive(ctx, next);
        }

        // Detail window for the selected post
        if let Some(post) = self.view.selected().cloned() {
            let mut open = true;
            let detail_actions = egui::Window::new(post.title_text().to_string())
                .id(egui::Id::new("post_detail"))
                .open(&mut open)
                .collapsible(false)
                .default_size([720.0, 640.0])
                .show(ctx, |ui| self.render_detail(ui, &post))
                .and_then(|response| response.inner)
                .unwrap_or_default();

            let url = post.web_url(&self.config.site_url);
            for action in detail_actions {
                match action {
                    DetailAction::Upvote => self.upvote(ctx, &post),
                    DetailAction::OpenInBrowser => self.open_link(&url),
                    DetailAction::CopyLink => self.copy_link(&url),
                }
            }

            if !open {
                self.close_post();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabnews_client::testing::ScriptedTransport;
    use crate::tabnews_client::RetryPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_app() -> TabTokApp {
        let dir = std::env::temp_dir().join("tabtok-app-tests");
        let config = AppConfig::from_lookup(|key| {
            (key == "TABTOK_DATA_DIR").then(|| dir.display().to_string())
        })
        .unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let client = TabNewsClient::with_transport(Arc::new(ScriptedTransport::new(Vec::new())), RetryPolicy::default());
        let store = SettingsStore::in_memory().unwrap();
        TabTokApp::new(config, client, Arc::new(runtime), store, Settings::default())
    }

    #[test]
    fn page_served_from_cache_schedules_another_frame() {
        let ctx = egui::Context::default();
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = repaints.clone();
        ctx.set_request_repaint_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut app = test_app();
        app.drive(&ctx, NextPage::Served(1));

        assert!(app.groups_dirty);
        assert!(repaints.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn detail_scroll_height_never_goes_negative() {
        assert_eq!(detail_scroll_height(500.0), 460.0);
        assert_eq!(detail_scroll_height(ACTION_BAR_HEIGHT), 0.0);
        assert_eq!(detail_scroll_height(12.0), 0.0);
    }
}
