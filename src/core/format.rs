//! Log line rendering
//!
//! A [`LogFormat`] turns a `(context, line)` pair into the final text.
//! Formats are assembled from small [`Fragment`] renderers combined by
//! concatenation, spacing and bracketing; composition is plain string
//! building and no escaping is performed on user message content.

use super::annotation::LogAnnotation;
use super::context::LogContext;
use super::timestamp::TimestampFormat;
use colored::Colorize;

/// Pure rendering of `(context, line)` to text.
pub trait LogFormat: Send + Sync {
    fn format(&self, context: &LogContext, line: &str) -> String;
}

/// Adapter turning a plain function into a [`LogFormat`].
pub struct FnFormat<F>(F);

/// Build a format from a function over `(context, line)`.
pub fn from_fn<F>(f: F) -> FnFormat<F>
where
    F: Fn(&LogContext, &str) -> String + Send + Sync,
{
    FnFormat(f)
}

impl<F> LogFormat for FnFormat<F>
where
    F: Fn(&LogContext, &str) -> String + Send + Sync,
{
    fn format(&self, context: &LogContext, line: &str) -> String {
        (self.0)(context, line)
    }
}

/// One renderer piece of an assembled format.
///
/// # Example
///
/// ```
/// use annolog::core::{AssembledFormat, Fragment, LogFormat};
/// use annolog::core::{LogAnnotation, LogContext, LogLevel};
///
/// let format = AssembledFormat::new(
///     Fragment::level_upper()
///         .bracketed()
///         .spaced(Fragment::name())
///         .spaced(Fragment::line()),
/// );
///
/// let ctx = LogContext::empty()
///     .annotate(&LogAnnotation::logger_name(), vec!["a".into(), "b".into()])
///     .annotate(&LogAnnotation::level(), LogLevel::Warn);
/// assert_eq!(format.format(&ctx, "test message"), "[WARN] a.b test message");
/// ```
pub struct Fragment {
    render: Box<dyn Fn(&mut String, &LogContext, &str) + Send + Sync>,
}

impl Fragment {
    pub fn new(render: impl Fn(&mut String, &LogContext, &str) + Send + Sync + 'static) -> Self {
        Self {
            render: Box::new(render),
        }
    }

    /// A fixed piece of text.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        Fragment::new(move |out, _, _| out.push_str(&text))
    }

    /// The message body.
    pub fn line() -> Self {
        Fragment::new(|out, _, line| out.push_str(line))
    }

    /// The level annotation, rendered lowercase.
    pub fn level() -> Self {
        Fragment::annotation(LogAnnotation::level())
    }

    /// The level annotation, upper-cased.
    pub fn level_upper() -> Self {
        Fragment::annotation_with(LogAnnotation::level(), |l| l.to_str().to_string())
    }

    /// The dot-joined logger name.
    pub fn name() -> Self {
        Fragment::annotation(LogAnnotation::logger_name())
    }

    /// The timestamp annotation, rendered with the given format; empty when
    /// no timestamp was stamped.
    pub fn timestamp(format: TimestampFormat) -> Self {
        Fragment::annotation_with(LogAnnotation::timestamp(), move |t| {
            t.map(|t| format.format(&t)).unwrap_or_default()
        })
    }

    /// The rendered cause on its own line, when one is present.
    pub fn error() -> Self {
        Fragment::new(|out, ctx, _| {
            let rendered = ctx.render(&LogAnnotation::cause());
            if !rendered.is_empty() {
                out.push('\n');
                out.push_str(&rendered);
            }
        })
    }

    /// Any annotation, rendered with its own `render` function.
    pub fn annotation<V: Clone + Send + Sync + 'static>(annotation: LogAnnotation<V>) -> Self {
        Fragment::new(move |out, ctx, _| out.push_str(&ctx.render(&annotation)))
    }

    /// Any annotation, rendered with a custom function over its value.
    pub fn annotation_with<V: Clone + Send + Sync + 'static>(
        annotation: LogAnnotation<V>,
        render: impl Fn(V) -> String + Send + Sync + 'static,
    ) -> Self {
        Fragment::new(move |out, ctx, _| out.push_str(&render(ctx.get(&annotation))))
    }

    /// `self` immediately followed by `next`.
    pub fn then(self, next: Fragment) -> Fragment {
        Fragment::new(move |out, ctx, line| {
            (self.render)(out, ctx, line);
            (next.render)(out, ctx, line);
        })
    }

    /// `self`, one space, `next`.
    pub fn spaced(self, next: Fragment) -> Fragment {
        Fragment::new(move |out, ctx, line| {
            (self.render)(out, ctx, line);
            out.push(' ');
            (next.render)(out, ctx, line);
        })
    }

    /// `self` wrapped in square brackets.
    pub fn bracketed(self) -> Fragment {
        Fragment::new(move |out, ctx, line| {
            out.push('[');
            (self.render)(out, ctx, line);
            out.push(']');
        })
    }
}

/// A [`LogFormat`] built from an assembled [`Fragment`].
pub struct AssembledFormat {
    fragment: Fragment,
}

impl AssembledFormat {
    pub fn new(fragment: Fragment) -> Self {
        Self { fragment }
    }
}

impl LogFormat for AssembledFormat {
    fn format(&self, context: &LogContext, line: &str) -> String {
        let mut out = String::new();
        (self.fragment.render)(&mut out, context, line);
        out
    }
}

/// Plain `timestamp level name line` rendering with the cause appended on
/// its own line. Empty pieces (no timestamp, no name) are skipped rather
/// than leaving double spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleFormat;

impl LogFormat for SimpleFormat {
    fn format(&self, context: &LogContext, line: &str) -> String {
        let pieces = [
            context.render(&LogAnnotation::timestamp()),
            context.render(&LogAnnotation::level()),
            context.render(&LogAnnotation::logger_name()),
            line.to_string(),
        ];
        let mut out = pieces
            .iter()
            .filter(|piece| !piece.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");

        let cause = context.render(&LogAnnotation::cause());
        if !cause.is_empty() {
            out.push('\n');
            out.push_str(&cause);
        }
        out
    }
}

/// `time LEVEL [name] line` with per-level colors; the rendered cause
/// follows on its own line in the level's color.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColoredFormat;

impl LogFormat for ColoredFormat {
    fn format(&self, context: &LogContext, line: &str) -> String {
        let level = context.get(&LogAnnotation::level());
        let color = level.color_code();

        // Pad before coloring so escape codes do not skew the width.
        let tag = format!("{:>5}", level.to_str().to_lowercase()).color(color);
        let time = context
            .render(&LogAnnotation::timestamp())
            .color(colored::Color::Blue);
        let name = context
            .render(&LogAnnotation::logger_name())
            .color(colored::Color::White);

        let mut out = format!("{} {} [{}] {}", time, tag, name, line.color(color));

        let cause = context.render(&LogAnnotation::cause());
        if !cause.is_empty() {
            out.push('\n');
            out.push_str(&cause.color(color).to_string());
        }
        out
    }
}
