//! Keeps the text view and the form in step.
//!
//! Text edits are decoded, diffed against the last good snapshot and patched into
//! the form; form edits are serialized, encoded and written back to the text view.
//! Each direction is debounced (last write wins) and guarded by a suppression flag
//! so the update one direction makes is never echoed back by the other.

use crate::codec::{self, ParseError};
use crate::config::EditorConfig;
use crate::diff::{ChangeSet, diff};
use crate::form::{FormEdit, FormError, FormEvent, FormModel};
use crate::path::Path;
use crate::schema::SchemaNode;
use crate::{Value, statics};
use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// The text editor widget, seen from the sync engine.
pub trait TextEditor {
    fn value(&self) -> String;
    fn set_value(&mut self, text: &str);
    /// Show or clear an inline parse error.
    fn mark_error(&mut self, _error: Option<&ParseError>) {}
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no form available (the schema failed to load)")]
    Degraded,
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Re-entrancy flags shared with whoever needs to observe them (e.g. editor callbacks).
#[derive(Debug, Clone, Default)]
pub struct SyncFlags {
    applying_to_form: Rc<Cell<bool>>,
    applying_to_text: Rc<Cell<bool>>,
}

impl SyncFlags {
    pub fn applying_to_form(&self) -> bool {
        self.applying_to_form.get()
    }

    pub fn applying_to_text(&self) -> bool {
        self.applying_to_text.get()
    }

    pub fn enter_form(&self) -> SuppressionGuard {
        SuppressionGuard::set(&self.applying_to_form)
    }

    pub fn enter_text(&self) -> SuppressionGuard {
        SuppressionGuard::set(&self.applying_to_text)
    }
}

/// Holds one flag raised; lowers it on drop, unwinding included.
pub struct SuppressionGuard {
    flag: Rc<Cell<bool>>,
}

impl SuppressionGuard {
    fn set(flag: &Rc<Cell<bool>>) -> Self {
        flag.set(true);
        Self { flag: flag.clone() }
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Last-write-wins deadline: every `schedule` pushes the deadline out again.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Drop the pending run; returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once per schedule, when `now` has reached the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Valid,
    Invalid(ParseError),
}

/// Everything one editing session owns besides the text widget.
#[derive(Default)]
pub struct EditorSession {
    /// `None` in text-only mode (no schema).
    pub form: Option<FormModel>,
    /// Last successfully decoded (or serialized) document.
    pub previous: Value,
    pub status: Option<SyncStatus>,
    /// Startup failures, shown until the next successful load.
    pub banner: Option<String>,
}

impl EditorSession {
    pub fn is_degraded(&self) -> bool {
        self.form.is_none()
    }
}

pub struct SyncController<E: TextEditor> {
    editor: E,
    session: EditorSession,
    config: EditorConfig,
    flags: SyncFlags,
    text_debounce: Debouncer,
    form_debounce: Debouncer,
}

impl<E: TextEditor> SyncController<E> {
    pub fn new(editor: E, config: EditorConfig) -> Self {
        Self {
            editor,
            session: EditorSession {
                previous: Value::object(),
                ..Default::default()
            },
            text_debounce: Debouncer::new(config.debounce),
            form_debounce: Debouncer::new(config.debounce),
            config,
            flags: SyncFlags::default(),
        }
    }

    /// Build a controller and run the initial load.
    pub fn start(
        schema: anyhow::Result<SchemaNode>,
        values: anyhow::Result<String>,
        editor: E,
        config: EditorConfig,
    ) -> Self {
        let mut controller = Self::new(editor, config);
        controller.load(schema, values);
        controller
    }

    /// (Re)load both sources. A failed schema leaves the editor in text-only mode;
    /// a failed values file leaves the text view as it is. Both end up in the banner.
    pub fn load(&mut self, schema: anyhow::Result<SchemaNode>, values: anyhow::Result<String>) {
        self.text_debounce.cancel();
        self.form_debounce.cancel();
        let mut banner = Vec::new();

        match values {
            Ok(text) => {
                let _guard = self.flags.enter_text();
                self.editor.set_value(&text);
            }
            Err(e) => {
                log::error!("{}: {e:#}", statics::EN_ERR_PREFIX_VALUES);
                banner.push(format!("{}: {e:#}", statics::EN_ERR_PREFIX_VALUES));
            }
        }

        self.session.form = match schema {
            Ok(schema) => Some(FormModel::build(Rc::new(schema), self.config.form_options())),
            Err(e) => {
                log::error!("{}: {e:#}", statics::EN_ERR_PREFIX_SCHEMA);
                banner.push(format!("{}: {e:#}", statics::EN_ERR_PREFIX_SCHEMA));
                None
            }
        };
        self.session.banner = (!banner.is_empty()).then(|| banner.join("\n"));
        self.session.previous = Value::object();

        // Initial load: one full, non-diffed patch.
        if let Some(doc) = self.decode_editor() {
            if let Some(form) = self.session.form.as_mut() {
                let _guard = self.flags.enter_form();
                form.patch(&ChangeSet::full(&doc), &doc);
                form.take_events();
            }
            self.session.previous = doc;
        }
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn form(&self) -> Option<&FormModel> {
        self.session.form.as_ref()
    }

    pub fn status(&self) -> Option<&SyncStatus> {
        self.session.status.as_ref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn flags(&self) -> &SyncFlags {
        &self.flags
    }

    pub fn take_form_events(&mut self) -> Vec<FormEvent> {
        self.session
            .form
            .as_mut()
            .map(FormModel::take_events)
            .unwrap_or_default()
    }

    /// Earliest pending propagation, for scheduling the next `tick`.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.text_debounce.deadline(), self.form_debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.text_debounce.is_pending() || self.form_debounce.is_pending()
    }

    /// The user typed in the text view.
    pub fn text_changed(&mut self, now: Instant) {
        if self.flags.applying_to_text() {
            return;
        }
        // The text edit supersedes a form edit that has not reached the text yet.
        if self.form_debounce.cancel()
            && let Some(form) = self.session.form.as_ref()
        {
            self.session.previous = form.serialize();
        }
        self.text_debounce.schedule(now);
    }

    /// The user changed one form field.
    pub fn form_changed(&mut self, path: &Path, value: Value, now: Instant) -> Result<(), SyncError> {
        self.form_edit(
            FormEdit::SetValue {
                path: path.clone(),
                value,
            },
            now,
        )
    }

    /// Raw renderer input for a scalar field; parsed against the field's type.
    pub fn form_input(&mut self, path: &Path, text: &str, now: Instant) -> Result<(), SyncError> {
        if self.flags.applying_to_form() {
            return Ok(());
        }
        self.flush_text();
        let form = self.session.form.as_mut().ok_or(SyncError::Degraded)?;
        form.set_input(path, text)?;
        self.form_debounce.schedule(now);
        Ok(())
    }

    pub fn form_edit(&mut self, edit: FormEdit, now: Instant) -> Result<(), SyncError> {
        if self.flags.applying_to_form() {
            return Ok(());
        }
        self.flush_text();
        let form = self.session.form.as_mut().ok_or(SyncError::Degraded)?;
        log::debug!("form edit {edit:?}");
        // Rejected edits can still change the form (a duplicate key clears its entry).
        let result = form.apply(edit);
        self.form_debounce.schedule(now);
        result.map_err(SyncError::from)
    }

    /// Run whatever debounced propagation is due.
    pub fn tick(&mut self, now: Instant) {
        if self.text_debounce.fire(now) {
            self.sync_text_to_form();
        }
        if self.form_debounce.fire(now) {
            self.sync_form_to_text();
        }
    }

    /// Propagate everything pending right away (e.g. before exporting).
    pub fn flush(&mut self) {
        self.flush_text();
        if self.form_debounce.cancel() {
            self.sync_form_to_text();
        }
    }

    fn flush_text(&mut self) {
        if self.text_debounce.cancel() {
            self.sync_text_to_form();
        }
    }

    /// Decode the text view and record the outcome; `None` on a parse error.
    fn decode_editor(&mut self) -> Option<Value> {
        match codec::decode(&self.editor.value()) {
            Ok(doc) => {
                self.editor.mark_error(None);
                self.session.status = Some(SyncStatus::Valid);
                Some(doc)
            }
            Err(e) => {
                log::debug!("text does not parse: {e}");
                self.editor.mark_error(Some(&e));
                self.session.status = Some(SyncStatus::Invalid(e));
                None
            }
        }
    }

    /// Text -> form. A parse error leaves the form at its last good state.
    pub fn sync_text_to_form(&mut self) {
        let Some(doc) = self.decode_editor() else {
            return;
        };
        if let Some(form) = self.session.form.as_mut() {
            let changes = diff(&self.session.previous, &doc);
            if !changes.is_empty() {
                log::debug!("patching {} changed paths into the form", changes.len());
                let _guard = self.flags.enter_form();
                form.patch(&changes, &doc);
            }
        }
        self.session.previous = doc;
    }

    /// Form -> text.
    pub fn sync_form_to_text(&mut self) {
        let Some(form) = self.session.form.as_ref() else {
            return;
        };
        let doc = form.serialize();
        let text = codec::encode(&doc);
        {
            let _guard = self.flags.enter_text();
            self.editor.set_value(&text);
        }
        self.editor.mark_error(None);
        self.session.status = Some(SyncStatus::Valid);
        log::debug!("wrote {} bytes of YAML from the form", text.len());
        self.session.previous = doc;
    }
}

/// Plain in-memory text buffer, the editor used by the GUI's text panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBuffer {
    pub text: String,
    pub error: Option<ParseError>,
}

impl TextEditor for TextBuffer {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn set_value(&mut self, text: &str) {
        text.clone_into(&mut self.text);
    }

    fn mark_error(&mut self, error: Option<&ParseError>) {
        self.error = error.cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::{Debouncer, SyncController, SyncError, SyncFlags, SyncStatus, TextEditor};
    use crate::codec::{ParseError, decode};
    use crate::config::EditorConfig;
    use crate::path::Path;
    use crate::schema::SchemaNode;
    use crate::Value;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    const SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "replicas": { "type": "integer", "default": 1 },
            "image": {
                "type": "object",
                "properties": { "tag": { "type": "string" } }
            },
            "ports": { "type": "array", "items": { "type": "integer" } }
        }
    }"#;

    /// Records every write and the suppression flags seen during it.
    #[derive(Default)]
    struct MockEditor {
        text: String,
        flags: Option<SyncFlags>,
        writes: Vec<(String, bool)>,
        error: Option<ParseError>,
    }

    impl TextEditor for MockEditor {
        fn value(&self) -> String {
            self.text.clone()
        }

        fn set_value(&mut self, text: &str) {
            let suppressed = self.flags.as_ref().is_some_and(SyncFlags::applying_to_text);
            self.writes.push((text.to_owned(), suppressed));
            self.text = text.to_owned();
        }

        fn mark_error(&mut self, error: Option<&ParseError>) {
            self.error = error.cloned();
        }
    }

    fn config() -> EditorConfig {
        EditorConfig {
            debounce: Duration::from_millis(100),
            ..Default::default()
        }
    }

    fn controller(values: &str) -> SyncController<MockEditor> {
        let mut c = SyncController::new(MockEditor::default(), config());
        c.editor_mut().flags = Some(c.flags().clone());
        c.load(Ok(SchemaNode::parse_json(SCHEMA).unwrap()), Ok(values.to_owned()));
        c
    }

    fn type_text(c: &mut SyncController<MockEditor>, text: &str, now: Instant) {
        c.editor_mut().text = text.to_owned();
        c.text_changed(now);
    }

    #[test]
    fn debouncer_coalesces_to_the_last_edit() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.schedule(t0);
        d.schedule(t0 + Duration::from_millis(80));
        assert!(!d.fire(t0 + Duration::from_millis(120)));
        assert!(d.fire(t0 + Duration::from_millis(180)));
        assert!(!d.fire(t0 + Duration::from_millis(400)));
    }

    #[test]
    fn guard_clears_flag_even_on_panic() {
        let flags = SyncFlags::default();
        let inner = flags.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inner.enter_form();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!flags.applying_to_form());
    }

    #[test]
    fn initial_load_populates_the_form() {
        let c = controller("replicas: 3\n");
        let form = c.form().unwrap();
        let id = form.field_at(&Path::from("replicas")).unwrap();
        assert_eq!(form.field(id).unwrap().value(), Some(&Value::from(3_i64)));
        assert_eq!(c.status(), Some(&SyncStatus::Valid));
        assert_eq!(c.session().previous, decode("replicas: 3\n").unwrap());
    }

    #[test]
    fn text_edit_reaches_the_form_after_the_quiet_period() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        type_text(&mut c, "replicas: 4\n", t0);
        type_text(&mut c, "replicas: 5\n", t0 + Duration::from_millis(50));
        c.tick(t0 + Duration::from_millis(120));
        let value = |c: &SyncController<MockEditor>| {
            let form = c.form().unwrap();
            form.field(form.field_at(&Path::from("replicas")).unwrap())
                .unwrap()
                .value()
                .cloned()
        };
        assert_eq!(value(&c), Some(Value::from(3_i64)));
        c.tick(t0 + Duration::from_millis(150));
        assert_eq!(value(&c), Some(Value::from(5_i64)));
    }

    #[test]
    fn parse_error_leaves_form_untouched() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\nimage:\n  tag: v1\n");
        let before = c.form().unwrap().serialize();
        type_text(&mut c, "replicas: [3\n", t0);
        c.tick(t0 + Duration::from_millis(200));
        assert!(matches!(c.status(), Some(SyncStatus::Invalid(_))));
        assert!(c.editor().error.is_some());
        assert_eq!(c.form().unwrap().serialize(), before);

        type_text(&mut c, "replicas: 3\nimage:\n  tag: v2\n", t0 + Duration::from_millis(300));
        c.tick(t0 + Duration::from_millis(500));
        assert_eq!(c.status(), Some(&SyncStatus::Valid));
        assert!(c.editor().error.is_none());
        assert_eq!(
            c.form().unwrap().serialize(),
            decode("replicas: 3\nimage:\n  tag: v2\n").unwrap()
        );
    }

    #[test]
    fn form_edit_writes_text_under_suppression() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        c.editor_mut().writes.clear();
        c.form_changed(&Path::from("image.tag"), Value::from("v9"), t0)
            .unwrap();
        assert!(c.editor().writes.is_empty());
        c.tick(t0 + Duration::from_millis(100));
        let (text, suppressed) = c.editor().writes.last().cloned().unwrap();
        assert!(suppressed);
        assert!(!c.flags().applying_to_text());
        assert_eq!(decode(&text).unwrap(), decode("replicas: 3\nimage:\n  tag: v9\n").unwrap());
        assert_eq!(c.session().previous, decode(&text).unwrap());
    }

    #[test]
    fn echoed_text_change_is_ignored() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        {
            let _guard = c.flags().enter_text();
            c.text_changed(t0);
        }
        assert!(!c.is_pending());
    }

    #[test]
    fn form_change_during_patch_is_a_no_op() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        let guard = c.flags().enter_form();
        c.form_changed(&Path::from("replicas"), Value::from(9_i64), t0)
            .unwrap();
        drop(guard);
        assert!(!c.is_pending());
        assert_eq!(c.form().unwrap().serialize(), decode("replicas: 3\n").unwrap());
    }

    #[test]
    fn text_edit_wins_over_an_unsent_form_edit() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        c.form_changed(&Path::from("image.tag"), Value::from("v9"), t0)
            .unwrap();
        type_text(&mut c, "replicas: 4\n", t0 + Duration::from_millis(10));
        c.tick(t0 + Duration::from_millis(500));
        assert_eq!(c.form().unwrap().serialize(), decode("replicas: 4\n").unwrap());
        assert_eq!(c.editor().text, "replicas: 4\n");
    }

    #[test]
    fn pending_text_is_applied_before_a_form_edit() {
        let t0 = Instant::now();
        let mut c = controller("replicas: 3\n");
        type_text(&mut c, "replicas: 4\n", t0);
        c.form_changed(&Path::from("image.tag"), Value::from("v1"), t0 + Duration::from_millis(10))
            .unwrap();
        c.flush();
        assert_eq!(
            decode(&c.editor().text).unwrap(),
            decode("replicas: 4\nimage:\n  tag: v1\n").unwrap()
        );
    }

    #[test]
    fn missing_schema_degrades_to_text_only() {
        let t0 = Instant::now();
        let mut c = SyncController::start(
            Err(anyhow::anyhow!("no such file")),
            Ok("replicas: 3\n".to_owned()),
            MockEditor::default(),
            config(),
        );
        assert!(c.session().is_degraded());
        assert!(c.session().banner.as_deref().unwrap().contains("no such file"));
        assert!(matches!(
            c.form_changed(&Path::from("replicas"), Value::from(1_i64), t0),
            Err(SyncError::Degraded)
        ));
        type_text(&mut c, "replicas: [\n", t0);
        c.tick(t0 + Duration::from_millis(200));
        assert!(matches!(c.status(), Some(SyncStatus::Invalid(_))));
    }

    #[test]
    fn next_deadline_is_the_earliest_pending() {
        let t0 = Instant::now();
        let mut c = controller("");
        assert_eq!(c.next_deadline(), None);
        type_text(&mut c, "replicas: 2\n", t0);
        assert_eq!(c.next_deadline(), Some(t0 + Duration::from_millis(100)));
    }
}
