use crate::config::EditorConfig;
use crate::form::{FieldId, FieldKind, FormEdit, FormError, FormEvent, FormField, FormModel, MapEntry, is_numeric_key};
use crate::path::Path;
use crate::schema::{ScalarType, SchemaKind};
use crate::sync::{SyncController, SyncError, SyncStatus, TextBuffer};
use crate::{Value, source, statics};
use eframe::egui;
use egui::collapsing_header::CollapsingState;
use egui_extras::{Column, TableBuilder};
use std::{collections::HashMap, path::PathBuf, time::Instant};

pub fn run_gui(config: EditorConfig) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(ValformApp::new(config)))),
    )
}

/// What an input buffer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum BufferKey {
    /// Text of a scalar input.
    Value(FieldId),
    /// Key input of a map entry: (map, entry value field).
    Key(FieldId, FieldId),
}

/// An edit collected while rendering, applied once the frame's form borrow is over.
#[derive(Clone, Debug, PartialEq)]
enum UiEdit {
    Form(FormEdit),
    /// Raw text typed into a scalar input.
    Input { path: Path, text: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListOp {
    Delete(usize),
    MoveUp(usize),
    MoveDown(usize),
}

impl ListOp {
    fn array_edit(self, path: &Path) -> FormEdit {
        let path = path.clone();
        match self {
            ListOp::Delete(index) => FormEdit::RemoveItem { path, index },
            ListOp::MoveUp(from) => FormEdit::MoveItem {
                path,
                from,
                to: from.saturating_sub(1),
            },
            ListOp::MoveDown(from) => FormEdit::MoveItem {
                path,
                from,
                to: from + 1,
            },
        }
    }

    fn map_edit(self, path: &Path) -> FormEdit {
        let path = path.clone();
        match self {
            ListOp::Delete(index) => FormEdit::RemoveEntry { path, index },
            ListOp::MoveUp(from) => FormEdit::MoveEntry {
                path,
                from,
                to: from.saturating_sub(1),
            },
            ListOp::MoveDown(from) => FormEdit::MoveEntry {
                path,
                from,
                to: from + 1,
            },
        }
    }
}

/// Drop buffers whose field changed underneath them, so they are re-read from the model.
/// `keep` is the field the user is typing into; its own edit must not reset its text.
fn refresh_buffers(
    buffers: &mut HashMap<BufferKey, String>,
    events: Vec<FormEvent>,
    keep: Option<FieldId>,
) {
    for event in events {
        match event {
            FormEvent::ValueChanged(id) if Some(id) != keep => {
                buffers.remove(&BufferKey::Value(id));
            }
            FormEvent::ItemsChanged(map) => {
                buffers.retain(|k, _| !matches!(k, BufferKey::Key(m, _) if *m == map));
            }
            FormEvent::Removed(id) => {
                buffers.retain(|k, _| {
                    !matches!(k, BufferKey::Value(v) | BufferKey::Key(_, v) if *v == id)
                });
            }
            FormEvent::ValueChanged(_) | FormEvent::ErrorChanged(_) => {}
        }
    }
}

fn is_scalar_kind(kind: SchemaKind) -> bool {
    matches!(kind, SchemaKind::Enum | SchemaKind::Scalar(_))
}

fn field_label(ui: &mut egui::Ui, field: &FormField, label: &str, required: bool) {
    let text = if required {
        format!("{label} {}", statics::EN_MARK_REQUIRED)
    } else {
        label.to_owned()
    };
    let mut resp = ui.label(text);
    if let Some(desc) = field.schema().description.as_deref() {
        resp = resp.on_hover_text(desc);
    }
    if required {
        resp.on_hover_text(statics::EN_TIP_REQUIRED);
    }
}

fn unmapped_note(ui: &mut egui::Ui, value: &Value) {
    ui.horizontal_wrapped(|ui| {
        ui.colored_label(egui::Color32::YELLOW, statics::EN_LABEL_UNMAPPED);
        ui.monospace(value.preview());
    });
}

fn list_buttons(ui: &mut egui::Ui, idx: usize, up: bool, down: bool, op: &mut Option<ListOp>) {
    ui.horizontal(|ui| {
        if ui
            .add_enabled(up, egui::Button::new(statics::EN_BTN_UP).small())
            .clicked()
        {
            *op = Some(ListOp::MoveUp(idx));
        }
        if ui
            .add_enabled(down, egui::Button::new(statics::EN_BTN_DOWN).small())
            .clicked()
        {
            *op = Some(ListOp::MoveDown(idx));
        }
        if ui.small_button(statics::EN_BTN_DELETE).clicked() {
            *op = Some(ListOp::Delete(idx));
        }
    });
}

/// One frame's worth of form rendering.
struct FormView<'a> {
    form: &'a FormModel,
    buffers: &'a mut HashMap<BufferKey, String>,
    edits: Vec<UiEdit>,
}

impl FormView<'_> {
    fn root(&mut self, ui: &mut egui::Ui) {
        let form = self.form;
        let Some(root) = form.field(form.root()) else {
            return;
        };
        match root.kind() {
            FieldKind::Object { children, .. } if children.is_empty() => {
                ui.label(statics::EN_EMPTY_SCHEMA);
            }
            FieldKind::Object { .. } => self.object_body(ui, root),
            _ => self.field(ui, root.id(), ""),
        }
    }

    fn field(&mut self, ui: &mut egui::Ui, id: FieldId, name: &str) {
        let form = self.form;
        let Some(field) = form.field(id) else {
            return;
        };
        let Some(path) = form.path_of(id) else {
            return;
        };
        let label = field.schema().display_label(name).to_owned();
        let required = form.is_required(id);
        match field.kind() {
            FieldKind::Object { toggle, .. } => {
                let state = CollapsingState::load_with_default_open(
                    ui.ctx(),
                    ui.make_persistent_id(("field", id)),
                    path.len() <= 1,
                );
                state
                    .show_header(ui, |ui| {
                        if let Some(toggle) = toggle {
                            self.toggle_checkbox(ui, *toggle);
                        }
                        field_label(ui, field, &label, required);
                        self.reset_button(ui, field, &path);
                    })
                    .body(|ui| self.object_body(ui, field));
            }
            FieldKind::Array { items } => self.array(ui, field, &path, &label, required, items),
            FieldKind::Map { entries } => self.map(ui, field, &path, &label, required, entries),
            FieldKind::Scalar { .. } => {
                ui.horizontal(|ui| {
                    field_label(ui, field, &label, required);
                    self.scalar_input(ui, id);
                    self.reset_button(ui, field, &path);
                });
                if let Some(v) = field.unmapped() {
                    unmapped_note(ui, v);
                }
                self.field_error(ui, field);
            }
        }
    }

    fn object_body(&mut self, ui: &mut egui::Ui, field: &FormField) {
        let FieldKind::Object {
            children,
            toggle,
            extras,
        } = field.kind()
        else {
            return;
        };
        if let Some(v) = field.unmapped() {
            unmapped_note(ui, v);
        }
        for (name, child) in children {
            if Some(*child) == *toggle {
                continue;
            }
            self.field(ui, *child, name);
        }
        if !extras.is_empty() {
            ui.colored_label(egui::Color32::YELLOW, statics::EN_LABEL_EXTRA_KEYS);
            for (key, value) in extras {
                ui.monospace(format!("{key}: {}", value.preview()));
            }
        }
    }

    /// Items or entry values that are objects themselves get their fields inline.
    fn nested_body(&mut self, ui: &mut egui::Ui, id: FieldId) {
        let form = self.form;
        match form.field(id) {
            Some(field) if matches!(field.kind(), FieldKind::Object { .. }) => {
                self.object_body(ui, field)
            }
            Some(_) => self.field(ui, id, ""),
            None => {}
        }
    }

    fn toggle_checkbox(&mut self, ui: &mut egui::Ui, toggle: FieldId) {
        let form = self.form;
        let (Some(field), Some(path)) = (form.field(toggle), form.path_of(toggle)) else {
            return;
        };
        let mut on = field.display_value().is_some_and(Value::is_truthy);
        let mut resp = ui.checkbox(&mut on, "");
        if let Some(desc) = field.schema().description.as_deref() {
            resp = resp.on_hover_text(desc);
        }
        if resp.changed() {
            self.edits.push(UiEdit::Form(FormEdit::SetValue {
                path,
                value: Value::Bool(on),
            }));
        }
    }

    fn reset_button(&mut self, ui: &mut egui::Ui, field: &FormField, path: &Path) {
        let dirty = field.overridden() || field.unmapped().is_some();
        if dirty
            && ui
                .small_button(statics::EN_BTN_RESET)
                .on_hover_text(statics::EN_TIP_RESET)
                .clicked()
        {
            self.edits
                .push(UiEdit::Form(FormEdit::Reset { path: path.clone() }));
        }
    }

    fn field_error(&mut self, ui: &mut egui::Ui, field: &FormField) {
        if let Some(err) = field.error() {
            ui.colored_label(egui::Color32::RED, err.to_string());
        }
    }

    fn scalar_input(&mut self, ui: &mut egui::Ui, id: FieldId) {
        let form = self.form;
        let (Some(field), Some(path)) = (form.field(id), form.path_of(id)) else {
            return;
        };
        let schema = field.schema();
        match schema.kind() {
            SchemaKind::Enum => {
                let current = field
                    .display_value()
                    .map(Value::preview)
                    .unwrap_or_else(|| statics::EN_HINT_UNSET.to_owned());
                egui::ComboBox::from_id_salt(("enum", id))
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for option in schema.enum_values.iter().flatten() {
                            let selected = field.display_value() == Some(option);
                            if ui.selectable_label(selected, option.preview()).clicked() {
                                self.edits.push(UiEdit::Form(FormEdit::SetValue {
                                    path: path.clone(),
                                    value: option.clone(),
                                }));
                            }
                        }
                    });
            }
            SchemaKind::Scalar(ScalarType::Boolean) => {
                let mut on = field.display_value().is_some_and(Value::is_truthy);
                if ui.checkbox(&mut on, "").changed() {
                    self.edits.push(UiEdit::Form(FormEdit::SetValue {
                        path,
                        value: Value::Bool(on),
                    }));
                }
            }
            _ => {
                let buf = self.buffers.entry(BufferKey::Value(id)).or_insert_with(|| {
                    field
                        .value()
                        .filter(|v| !matches!(v, Value::Null))
                        .map(Value::preview)
                        .unwrap_or_default()
                });
                let hint = [
                    schema
                        .default
                        .as_ref()
                        .map(|d| format!("{}{}", statics::EN_PREFIX_DEFAULT, d.preview())),
                    schema
                        .range_hint()
                        .map(|r| format!("{}{r}", statics::EN_PREFIX_RANGE)),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", ");
                let resp = ui.add(
                    egui::TextEdit::singleline(buf)
                        .hint_text(hint)
                        .desired_width(240.0),
                );
                if resp.changed() {
                    self.edits.push(UiEdit::Input {
                        path,
                        text: buf.clone(),
                    });
                }
            }
        }
    }

    fn array(
        &mut self,
        ui: &mut egui::Ui,
        field: &FormField,
        path: &Path,
        label: &str,
        required: bool,
        items: &[FieldId],
    ) {
        let id = field.id();
        let state = CollapsingState::load_with_default_open(
            ui.ctx(),
            ui.make_persistent_id(("field", id)),
            false,
        );
        state
            .show_header(ui, |ui| {
                field_label(ui, field, label, required);
                ui.weak(format!("({})", items.len()));
                self.reset_button(ui, field, path);
            })
            .body(|ui| {
                if let Some(v) = field.unmapped() {
                    unmapped_note(ui, v);
                }
                let len = items.len();
                let mut op: Option<ListOp> = None;
                if is_scalar_kind(field.schema().item_schema().kind()) {
                    let row_h = ui.text_style_height(&egui::TextStyle::Body) + 8.0;
                    ui.push_id(("items", id), |ui| {
                        TableBuilder::new(ui)
                            .striped(true)
                            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                            .column(Column::initial(50.0).resizable(false))
                            .column(Column::remainder().resizable(true))
                            .column(Column::initial(150.0).resizable(false))
                            .header(row_h, |mut header| {
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_INDEX);
                                });
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_VALUE);
                                });
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_ACTIONS);
                                });
                            })
                            .body(|mut body| {
                                for (idx, item) in items.iter().enumerate() {
                                    body.row(row_h, |mut row| {
                                        row.col(|ui| {
                                            ui.monospace(idx.to_string());
                                        });
                                        row.col(|ui| {
                                            self.scalar_input(ui, *item);
                                        });
                                        row.col(|ui| {
                                            list_buttons(ui, idx, idx > 0, idx + 1 < len, &mut op);
                                        });
                                    });
                                }
                            });
                    });
                    for item in items {
                        if let Some(item) = self.form.field(*item) {
                            self.field_error(ui, item);
                        }
                    }
                } else {
                    for (idx, item) in items.iter().enumerate() {
                        ui.push_id(("item", *item), |ui| {
                            ui.horizontal(|ui| {
                                ui.monospace(format!("[{idx}]"));
                                list_buttons(ui, idx, idx > 0, idx + 1 < len, &mut op);
                            });
                            egui::Frame::group(ui.style()).show(ui, |ui| {
                                self.nested_body(ui, *item);
                            });
                        });
                    }
                }
                if let Some(op) = op {
                    self.edits.push(UiEdit::Form(op.array_edit(path)));
                }
                if ui.button(statics::EN_BTN_ADD_ITEM).clicked() {
                    self.edits
                        .push(UiEdit::Form(FormEdit::AddItem { path: path.clone() }));
                }
            });
    }

    fn key_input(&mut self, ui: &mut egui::Ui, map: FieldId, path: &Path, index: usize, entry: &MapEntry) {
        let buf = self
            .buffers
            .entry(BufferKey::Key(map, entry.value))
            .or_insert_with(|| entry.key.clone());
        let mut resp = ui.add(
            egui::TextEdit::singleline(buf)
                .hint_text(statics::EN_HINT_KEY)
                .desired_width(160.0),
        );
        if is_numeric_key(&entry.key) {
            resp = resp.on_hover_text(statics::EN_TIP_NUMERIC_KEY);
        }
        // Keys are committed when the input loses focus, not per keystroke.
        if resp.lost_focus() && *buf != entry.key {
            self.edits.push(UiEdit::Form(FormEdit::RenameEntry {
                path: path.clone(),
                index,
                key: buf.clone(),
            }));
        }
        if let Some(err) = &entry.error {
            ui.colored_label(egui::Color32::RED, "!")
                .on_hover_text(err.to_string());
        }
    }

    fn map(
        &mut self,
        ui: &mut egui::Ui,
        field: &FormField,
        path: &Path,
        label: &str,
        required: bool,
        entries: &[MapEntry],
    ) {
        let id = field.id();
        let state = CollapsingState::load_with_default_open(
            ui.ctx(),
            ui.make_persistent_id(("field", id)),
            false,
        );
        let movable = |idx: usize| entries.get(idx).is_some_and(|e| !is_numeric_key(&e.key));
        state
            .show_header(ui, |ui| {
                field_label(ui, field, label, required);
                ui.weak(format!("({})", entries.len()));
                self.reset_button(ui, field, path);
            })
            .body(|ui| {
                if let Some(v) = field.unmapped() {
                    unmapped_note(ui, v);
                }
                let mut op: Option<ListOp> = None;
                if is_scalar_kind(field.schema().value_schema().kind()) {
                    let row_h = ui.text_style_height(&egui::TextStyle::Body) + 8.0;
                    ui.push_id(("entries", id), |ui| {
                        TableBuilder::new(ui)
                            .striped(true)
                            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                            .column(Column::initial(200.0).resizable(true))
                            .column(Column::remainder().resizable(true))
                            .column(Column::initial(150.0).resizable(false))
                            .header(row_h, |mut header| {
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_KEY);
                                });
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_VALUE);
                                });
                                header.col(|ui| {
                                    ui.strong(statics::EN_COL_ACTIONS);
                                });
                            })
                            .body(|mut body| {
                                for (idx, entry) in entries.iter().enumerate() {
                                    body.row(row_h, |mut row| {
                                        row.col(|ui| {
                                            self.key_input(ui, id, path, idx, entry);
                                        });
                                        row.col(|ui| {
                                            self.scalar_input(ui, entry.value);
                                        });
                                        row.col(|ui| {
                                            let up = movable(idx) && idx > 0 && movable(idx - 1);
                                            let down = movable(idx) && movable(idx + 1);
                                            list_buttons(ui, idx, up, down, &mut op);
                                        });
                                    });
                                }
                            });
                    });
                } else {
                    for (idx, entry) in entries.iter().enumerate() {
                        ui.push_id(("entry", entry.value), |ui| {
                            ui.horizontal(|ui| {
                                self.key_input(ui, id, path, idx, entry);
                                let up = movable(idx) && idx > 0 && movable(idx - 1);
                                let down = movable(idx) && movable(idx + 1);
                                list_buttons(ui, idx, up, down, &mut op);
                            });
                            egui::Frame::group(ui.style()).show(ui, |ui| {
                                self.nested_body(ui, entry.value);
                            });
                        });
                    }
                }
                if let Some(op) = op {
                    self.edits.push(UiEdit::Form(op.map_edit(path)));
                }
                if ui.button(statics::EN_BTN_ADD_ENTRY).clicked() {
                    self.edits
                        .push(UiEdit::Form(FormEdit::AddEntry { path: path.clone() }));
                }
            });
    }
}

/// The main application state: the sync engine plus per-field UI buffers.
struct ValformApp {
    sync: SyncController<TextBuffer>,
    buffers: HashMap<BufferKey, String>,
    dialog_dir: Option<PathBuf>,
    status: String,
    last_error: Option<String>,
    about_open: bool,
    theme_dark: bool,
}

impl ValformApp {
    fn new(config: EditorConfig) -> Self {
        let schema = source::load_schema(&config.schema_path);
        let values = source::load_values(&config.values_path);
        Self {
            sync: SyncController::start(schema, values, TextBuffer::default(), config),
            buffers: HashMap::new(),
            dialog_dir: None,
            status: String::new(),
            last_error: None,
            about_open: false,
            theme_dark: true,
        }
    }

    fn reload(&mut self) {
        let config = self.sync.config().clone();
        self.sync.load(
            source::load_schema(&config.schema_path),
            source::load_values(&config.values_path),
        );
        self.sync.take_form_events();
        self.buffers.clear();
        self.status = format!("Reloaded {}", config.values_path.display());
    }

    /// Export the text view. Pending edits are flushed into it first.
    fn export(&mut self) {
        self.sync.flush();
        let events = self.sync.take_form_events();
        refresh_buffers(&mut self.buffers, events, None);

        let dir = self.dialog_dir.clone().or_else(|| {
            self.sync
                .config()
                .values_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
        });
        let Some(path) = source::export_dialog(dir.as_deref()).save_file() else {
            return;
        };
        if let Some(parent) = path.parent() {
            self.dialog_dir = Some(parent.to_path_buf());
        }
        match source::export_values(&path, &self.sync.editor().text) {
            Ok(()) => {
                self.status = format!("Exported {}", path.display());
                self.last_error = None;
            }
            Err(e) => {
                self.last_error = Some(format!("{}: {e:#}", statics::EN_ERR_PREFIX_EXPORT));
            }
        }
    }

    fn apply_edits(&mut self, edits: Vec<UiEdit>) {
        let now = Instant::now();
        for edit in edits {
            let (result, typed) = match edit {
                UiEdit::Input { path, text } => {
                    let typed = self.sync.form().and_then(|f| f.field_at(&path));
                    (self.sync.form_input(&path, &text, now), typed)
                }
                UiEdit::Form(edit) => (self.sync.form_edit(edit, now), None),
            };
            let events = self.sync.take_form_events();
            refresh_buffers(&mut self.buffers, events, typed);
            match result {
                Ok(()) => {}
                // Shown next to the offending input.
                Err(SyncError::Form(
                    e @ (FormError::InvalidInput(_) | FormError::DuplicateKey { .. }),
                )) => log::debug!("rejected form input: {e}"),
                Err(e) => self.last_error = Some(format!("{e:#}")),
            }
        }
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        if self.sync.is_pending() {
            ui.weak(statics::EN_STATUS_PENDING);
        }
        match self.sync.status() {
            Some(SyncStatus::Valid) => {
                ui.colored_label(egui::Color32::GREEN, statics::EN_STATUS_VALID);
            }
            Some(SyncStatus::Invalid(err)) => {
                ui.colored_label(egui::Color32::RED, statics::EN_STATUS_INVALID)
                    .on_hover_text(err.to_string());
            }
            None => {}
        }
    }
}

impl eframe::App for ValformApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync.tick(Instant::now());
        let events = self.sync.take_form_events();
        refresh_buffers(&mut self.buffers, events, None);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui.button(statics::EN_BTN_EXPORT).clicked() {
                    self.export();
                }
                if ui.button(statics::EN_BTN_RELOAD).clicked() {
                    self.reload();
                }
                if ui.button(statics::EN_BTN_ABOUT).clicked() {
                    self.about_open = true;
                }
                if ui.button(statics::EN_BTN_TOGGLE_THEME).clicked() {
                    self.theme_dark = !self.theme_dark;
                    if self.theme_dark {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }

                ui.separator();
                self.render_status(ui);

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_ABOUT_HEADING);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.label(statics::EN_ABOUT_USAGE);
                    ui.label(statics::EN_ABOUT_SYNC);
                    ui.label(statics::EN_ABOUT_LOGGING);
                });
            self.about_open = open;
        }

        if let Some(banner) = self.sync.session().banner.clone() {
            egui::TopBottomPanel::top("banner_bar").show(ctx, |ui| {
                ui.colored_label(egui::Color32::RED, banner);
            });
        }

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        egui::SidePanel::left("text_panel")
            .resizable(true)
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.heading(statics::EN_HEADING_TEXT);
                ui.separator();
                let parse_error = self.sync.editor().error.clone();
                let reserve = if parse_error.is_some() { 48.0 } else { 0.0 };
                ui.push_id("text_scroll", |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .max_height(ui.available_height() - reserve)
                        .show(ui, |ui| {
                            let resp = ui.add(
                                egui::TextEdit::multiline(&mut self.sync.editor_mut().text)
                                    .code_editor()
                                    .desired_rows(30)
                                    .desired_width(f32::INFINITY),
                            );
                            if resp.changed() {
                                self.sync.text_changed(Instant::now());
                            }
                        });
                });
                if let Some(err) = parse_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err.to_string());
                }
            });

        let mut edits = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(statics::EN_HEADING_FORM);
            ui.separator();
            let Some(form) = self.sync.form() else {
                ui.label(statics::EN_DEGRADED_FORM);
                return;
            };
            ui.push_id("form_scroll", |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let mut view = FormView {
                            form,
                            buffers: &mut self.buffers,
                            edits: Vec::new(),
                        };
                        view.root(ui);
                        edits = view.edits;
                    });
            });
        });
        self.apply_edits(edits);

        if let Some(deadline) = self.sync.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferKey, ListOp, refresh_buffers};
    use crate::form::{FormEdit, FormEvent, FormModel, FormOptions};
    use crate::path::Path;
    use crate::schema::SchemaNode;
    use pretty_assertions::assert_eq;
    use std::{collections::HashMap, rc::Rc};

    #[test]
    fn list_ops_map_to_form_edits() {
        let path = Path::from("ports");
        assert_eq!(
            ListOp::MoveUp(2).array_edit(&path),
            FormEdit::MoveItem {
                path: path.clone(),
                from: 2,
                to: 1
            }
        );
        assert_eq!(
            ListOp::Delete(0).map_edit(&path),
            FormEdit::RemoveEntry {
                path: path.clone(),
                index: 0
            }
        );
    }

    #[test]
    fn buffers_follow_model_events() {
        let schema = SchemaNode::parse_json(
            r#"{ "properties": { "a": { "type": "string" }, "b": { "type": "string" }, "m": { "type": "object" } } }"#,
        )
        .unwrap();
        let form = FormModel::build(Rc::new(schema), FormOptions::default());
        let a = form.field_at(&Path::from("a")).unwrap();
        let b = form.field_at(&Path::from("b")).unwrap();
        let m = form.field_at(&Path::from("m")).unwrap();

        let mut buffers = HashMap::new();
        buffers.insert(BufferKey::Value(a), "typing".to_owned());
        buffers.insert(BufferKey::Value(b), "old".to_owned());
        buffers.insert(BufferKey::Key(m, b), "k".to_owned());

        refresh_buffers(
            &mut buffers,
            vec![FormEvent::ValueChanged(a), FormEvent::ValueChanged(b)],
            Some(a),
        );
        assert_eq!(buffers.get(&BufferKey::Value(a)).map(String::as_str), Some("typing"));
        assert_eq!(buffers.get(&BufferKey::Value(b)), None);

        refresh_buffers(&mut buffers, vec![FormEvent::ItemsChanged(m)], None);
        assert!(buffers.get(&BufferKey::Key(m, b)).is_none());
    }
}
