use std::{collections::VecDeque, time::Duration};

use arboard::Clipboard;
use client_core::{
    config::DEFAULT_BACKEND_URL, render_markup, Action, AnswerState, ContentView, Effect,
    PickedFile, RenderedContent, Workbench, LOADING_MARKER,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::error::{Workflow, WorkflowError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::{dispatch_backend_command, undeliverable},
};

const HIGHLIGHT_BG: egui::Color32 = egui::Color32::from_rgb(92, 78, 28);
const NOTICE_FILL: egui::Color32 = egui::Color32::from_rgb(111, 53, 53);
const NOTICE_STROKE: egui::Color32 = egui::Color32::from_rgb(175, 96, 96);

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub backend_url: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeClick {
    Dismiss,
    Retry,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    workbench: Workbench,
    pending_actions: Vec<Action>,
    // Sanitized form of the markup currently in the content pane.
    rendered: Option<(String, RenderedContent)>,

    backend_url_input: String,
    query_input: String,

    status: String,
    status_banner: Option<UiError>,
}

impl DesktopGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            workbench: Workbench::new(),
            pending_actions: Vec::new(),
            rendered: None,
            backend_url_input: startup.backend_url,
            query_input: String::new(),
            status: "Connecting to backend...".to_string(),
            status_banner: None,
        };
        app.apply(Action::Mount);
        app
    }

    fn apply(&mut self, action: Action) {
        let effects = self.workbench.dispatch(action);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            if let Err(rejected) =
                dispatch_backend_command(&self.cmd_tx, BackendCommand::Run(effect))
            {
                let reason = rejected.error.message().to_string();
                self.status_banner = Some(rejected.error);
                if let BackendCommand::Run(effect) = rejected.command {
                    queue.extend(self.workbench.complete(undeliverable(effect, &reason)));
                }
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Completed(completion) => {
                    let was_idle = self.workbench.upload().is_idle();
                    let effects = self.workbench.complete(completion);
                    let upload = self.workbench.upload();
                    if !was_idle && upload.is_idle() && upload.last_error().is_none() {
                        if let Some(receipt) = upload.last_receipt() {
                            self.status = receipt.to_string();
                        }
                    }
                    self.run_effects(effects);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "{}",
                        err.message()
                    );
                    self.status_banner = Some(err);
                }
            }
        }
    }

    fn reconfigure_backend(&mut self) {
        let backend_url = self.backend_url_input.trim().to_string();
        match dispatch_backend_command(&self.cmd_tx, BackendCommand::Reconfigure { backend_url })
        {
            Ok(()) => self.apply(Action::RefreshDocuments),
            Err(rejected) => self.status_banner = Some(rejected.error),
        }
    }

    fn sync_rendered_content(&mut self) {
        let ContentView::Ready { markup, .. } = self.workbench.content().view() else {
            self.rendered = None;
            return;
        };
        if self
            .rendered
            .as_ref()
            .is_some_and(|(cached, _)| cached == markup)
        {
            return;
        }
        self.rendered = Some((markup.clone(), render_markup(markup)));
    }

    fn has_outstanding_work(&self) -> bool {
        self.workbench.registry().is_refreshing()
            || self.workbench.content().view().is_loading()
            || !self.workbench.upload().is_idle()
            || self
                .workbench
                .query()
                .exchange()
                .is_some_and(|exchange| exchange.answer == AnswerState::Pending)
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(NOTICE_FILL)
                .stroke(egui::Stroke::new(1.0, NOTICE_STROKE))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            egui::RichText::new(banner.banner_text()).color(egui::Color32::WHITE),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        let mut reconfigure = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("DocuMind");
                ui.separator();

                if self.workbench.is_uploading() {
                    ui.spinner();
                    ui.label("Uploading...");
                } else if ui.button("Upload").clicked() {
                    self.pending_actions.push(Action::OpenUploadDialog);
                }
                if ui.button("Refresh").clicked() {
                    self.pending_actions.push(Action::RefreshDocuments);
                }
                if self.workbench.registry().is_refreshing() {
                    ui.spinner();
                }

                ui.separator();
                ui.label("Backend");
                let edit_resp = ui.add(
                    egui::TextEdit::singleline(&mut self.backend_url_input)
                        .hint_text(DEFAULT_BACKEND_URL)
                        .desired_width(260.0),
                );
                if edit_resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    reconfigure = true;
                }
                if ui.button("Connect").clicked() {
                    reconfigure = true;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.status);
                });
            });

            if let Some(click) = self
                .workbench
                .notice(Workflow::Upload)
                .and_then(|err| show_notice(ui, err, false))
            {
                self.pending_actions.push(notice_action(Workflow::Upload, click));
            }
            self.show_status_banner(ui);
            ui.add_space(4.0);
        });
        if reconfigure {
            self.reconfigure_backend();
        }
    }

    fn show_document_list(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("document_list")
            .resizable(true)
            .default_width(240.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.heading("Documents");
                if let Some(click) = self
                    .workbench
                    .notice(Workflow::Registry)
                    .and_then(|err| show_notice(ui, err, true))
                {
                    self.pending_actions.push(notice_action(Workflow::Registry, click));
                }
                ui.separator();

                let documents = self.workbench.documents();
                if documents.is_empty() {
                    ui.weak("No documents yet. Upload one to get started.");
                }
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for document in documents {
                        let is_selected = self.workbench.selected() == Some(document);
                        if ui.selectable_label(is_selected, document.name()).clicked() {
                            self.pending_actions
                                .push(Action::Select(Some(document.clone())));
                        }
                    }
                });

                if self.workbench.selected().is_some() {
                    ui.separator();
                    if ui.button("Clear selection").clicked() {
                        self.pending_actions.push(Action::Select(None));
                    }
                }
            });
    }

    fn show_content_pane(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(click) = self
                .workbench
                .notice(Workflow::Content)
                .and_then(|err| show_notice(ui, err, true))
            {
                self.pending_actions.push(notice_action(Workflow::Content, click));
            }

            let view = self.workbench.content().view();
            match view.document() {
                Some(document) => {
                    ui.heading(document.name());
                }
                None => {
                    ui.weak("Select a document to view its content.");
                    return;
                }
            }
            ui.separator();

            match view {
                ContentView::Loading { .. } => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(LOADING_MARKER);
                    });
                }
                ContentView::Ready { .. } => match &self.rendered {
                    Some((_, rendered)) if !rendered.is_empty() => {
                        egui::ScrollArea::vertical()
                            .auto_shrink([false, false])
                            .show(ui, |ui| show_rendered(ui, rendered));
                    }
                    _ => {
                        ui.weak("This document has no displayable text.");
                    }
                },
                ContentView::Unavailable { .. } => {
                    ui.weak("Content unavailable.");
                }
                ContentView::Empty => {}
            }
        });
    }

    fn show_query_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("query_panel")
            .resizable(true)
            .min_height(150.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                if let Some(click) = self
                    .workbench
                    .notice(Workflow::Query)
                    .and_then(|err| show_notice(ui, err, false))
                {
                    self.pending_actions.push(notice_action(Workflow::Query, click));
                }

                let has_selection = self.workbench.selected().is_some();
                let mut submit = false;
                ui.horizontal(|ui| {
                    let hint = if has_selection {
                        "Ask a question about this document"
                    } else {
                        "Select a document to ask about it"
                    };
                    let input_width = (ui.available_width() - 80.0).max(120.0);
                    let edit_resp = ui.add_enabled(
                        has_selection,
                        egui::TextEdit::singleline(&mut self.query_input)
                            .hint_text(hint)
                            .desired_width(input_width),
                    );
                    if edit_resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit = true;
                    }
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Submit"))
                        .clicked()
                    {
                        submit = true;
                    }
                });
                if submit && has_selection {
                    let query = std::mem::take(&mut self.query_input);
                    self.pending_actions.push(Action::SubmitQuery(query));
                }

                ui.separator();
                let Some(exchange) = self.workbench.query().exchange() else {
                    ui.weak("Answers appear here.");
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format!("Answer about {}", exchange.document)).strong(),
                    );
                    ui.weak(format!("Q: {}", exchange.query));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Clear").clicked() {
                            self.pending_actions.push(Action::ClearQuery);
                        }
                        let answered = matches!(exchange.answer, AnswerState::Answered(_));
                        if ui.add_enabled(answered, egui::Button::new("Copy")).clicked() {
                            match copy_to_clipboard(exchange.answer_text()) {
                                Ok(()) => self.status = "Answer copied to clipboard".to_string(),
                                Err(err) => {
                                    self.status_banner = Some(UiError::from_message(
                                        UiErrorContext::Clipboard,
                                        err,
                                    ));
                                }
                            }
                        }
                    });
                });
                egui::ScrollArea::vertical()
                    .auto_shrink([false, true])
                    .show(ui, |ui| match &exchange.answer {
                        AnswerState::Pending => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(LOADING_MARKER);
                            });
                        }
                        AnswerState::Answered(text) => {
                            ui.label(text);
                        }
                        AnswerState::Failed => {
                            ui.weak("No answer.");
                        }
                    });
            });
    }

    fn show_upload_dialog(&mut self, ctx: &egui::Context) {
        if !self.workbench.upload_dialog().is_open() {
            return;
        }
        let mut open = true;
        egui::Window::new("Upload document")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Choose file...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .set_title("Choose a document to upload")
                            .pick_file()
                        {
                            match PickedFile::from_path(path) {
                                Ok(file) => {
                                    self.pending_actions.push(Action::PickUploadFile(file))
                                }
                                Err(err) => {
                                    self.status_banner = Some(UiError::from_message(
                                        UiErrorContext::FilePicker,
                                        err.to_string(),
                                    ));
                                }
                            }
                        }
                    }
                    let picked = self
                        .workbench
                        .upload_dialog()
                        .picked()
                        .map(|file| file.name.as_str())
                        .unwrap_or("No file chosen");
                    ui.label(picked);
                });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Submit").clicked() {
                        self.pending_actions.push(Action::ConfirmUpload);
                    }
                    if ui.button("Close").clicked() {
                        self.pending_actions.push(Action::CloseUploadDialog);
                    }
                });
            });
        if !open {
            self.pending_actions.push(Action::CloseUploadDialog);
        }
    }
}

fn notice_action(workflow: Workflow, click: NoticeClick) -> Action {
    match (workflow, click) {
        (Workflow::Content, NoticeClick::Retry) => Action::RetryContent,
        (Workflow::Registry, NoticeClick::Retry) => Action::RefreshDocuments,
        _ => Action::DismissNotice(workflow),
    }
}

fn show_notice(ui: &mut egui::Ui, err: &WorkflowError, retryable: bool) -> Option<NoticeClick> {
    let mut click = None;
    egui::Frame::NONE
        .fill(NOTICE_FILL)
        .stroke(egui::Stroke::new(1.0, NOTICE_STROKE))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new(err.to_string()).color(egui::Color32::WHITE));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        click = Some(NoticeClick::Dismiss);
                    }
                    if retryable && err.is_retryable() && ui.button("Retry").clicked() {
                        click = Some(NoticeClick::Retry);
                    }
                });
            });
        });
    click
}

fn show_rendered(ui: &mut egui::Ui, content: &RenderedContent) {
    for paragraph in &content.paragraphs {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for span in &paragraph.spans {
                let text = egui::RichText::new(&span.text);
                let text = if span.highlighted {
                    text.strong().background_color(HIGHLIGHT_BG)
                } else {
                    text
                };
                ui.label(text);
            }
        });
        ui.add_space(10.0);
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard = Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_text(text.to_string())
        .map_err(|err| err.to_string())
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.sync_rendered_content();

        self.show_top_bar(ctx);
        self.show_query_panel(ctx);
        self.show_document_list(ctx);
        self.show_content_pane(ctx);
        self.show_upload_dialog(ctx);

        for action in std::mem::take(&mut self.pending_actions) {
            self.apply(action);
        }

        if self.has_outstanding_work() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
