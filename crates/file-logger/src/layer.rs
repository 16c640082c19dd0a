//! Bridge from `tracing` events into a [`FileLogger`]

use crate::level::Level;
use crate::logger::FileLogger;
use std::fmt::Write;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Events from this crate are never forwarded, otherwise the writer's own
/// diagnostics would queue records into the pool it is draining.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `tracing_subscriber` layer writing every event to a [`FileLogger`].
///
/// `TRACE` events are written at [`Level::Debug`]. The event's `message`
/// field becomes the log message and any other fields are appended as
/// `name=value` pairs.
#[derive(Debug, Clone)]
pub struct FileLoggerLayer {
    logger: Arc<FileLogger>,
}

impl FileLoggerLayer {
    /// Create a layer feeding `logger`
    #[must_use]
    pub const fn new(logger: Arc<FileLogger>) -> Self {
        Self { logger }
    }

    /// The logger receiving events
    #[must_use]
    pub const fn logger(&self) -> &Arc<FileLogger> {
        &self.logger
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S> Layer<S> for FileLoggerLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let level = Level::from(*metadata.level());
        if !level.passes(self.logger.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_empty() && visitor.fields.is_empty() {
            visitor.message.push_str(metadata.name());
        }

        let file = metadata.file().unwrap_or_else(|| metadata.target());
        let line = metadata.line().unwrap_or(0);
        if visitor.fields.is_empty() {
            self.logger
                .log(file, line, level, format_args!("{}", visitor.message));
        } else {
            self.logger.log(
                file,
                line,
                level,
                format_args!("{} {}", visitor.message, visitor.fields),
            );
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        write!(self.fields, "{name}={value}").ok();
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.clear();
            write!(self.message, "{value:?}").ok();
        } else {
            self.push_field(field.name(), &format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.clear();
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), &value);
        }
    }
}
