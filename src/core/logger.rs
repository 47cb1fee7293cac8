//! Owner-bound logger instances
//!
//! A [`Logger`] is a cheap handle to one shared instance. The instance
//! reads its configuration the first time it is used, keeps its current
//! level in an atomic for the hot path, and implements the temporary
//! override protocol under a per-instance lock.

use super::{
    appender::Appender,
    config::ConfigSource,
    error::{LoggerError, Result},
    field::Field,
    level_resolver::resolve_level,
    log_entry::{CallerInfo, LogEntry},
    log_level::LogLevel,
    registry::RegistryInner,
    rollback_timer::RollbackTimer,
    sink_router::{run_hooks, SinkRouter},
    sweeten::{render_message, render_template, sweeten, Arg},
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// State built by the one-shot initialization
struct Initialized {
    router: Mutex<SinkRouter>,
    name: Option<String>,
    with_caller: bool,
}

struct PendingRollback {
    generation: u64,
    _timer: RollbackTimer,
}

#[derive(Default)]
struct OverrideState {
    /// Level to restore when the pending rollback fires
    origin_level: Option<LogLevel>,
    pending: Option<PendingRollback>,
    next_generation: u64,
}

pub(crate) struct LoggerInner {
    identity: String,
    source: Arc<dyn ConfigSource>,
    level: AtomicU8,
    init: OnceCell<std::result::Result<Initialized, String>>,
    init_failure_reported: AtomicBool,
    overrides: Mutex<OverrideState>,
    registry: Weak<RegistryInner>,
}

impl LoggerInner {
    fn initialize(&self) -> std::result::Result<Initialized, String> {
        let config = self.source.load().map_err(|e| e.to_string())?;

        let level = match self.registry.upgrade().and_then(|r| r.level_patterns()) {
            Some(patterns) => resolve_level(&self.identity, &patterns),
            None => resolve_level(&self.identity, &config.levels),
        };
        let router = SinkRouter::from_config(&config).map_err(|e| e.to_string())?;

        self.level.store(level.as_u8(), Ordering::Release);
        Ok(Initialized {
            router: Mutex::new(router),
            name: config.name_mode.apply(&self.identity),
            with_caller: config.with_caller,
        })
    }

    /// Timer callback; ignored unless `generation` is still the pending one
    fn rollback(&self, generation: u64) {
        let mut state = self.overrides.lock();
        if state.pending.as_ref().map(|p| p.generation) != Some(generation) {
            return;
        }

        let _finished = state.pending.take();
        if let Some(origin) = state.origin_level.take() {
            self.level.store(origin.as_u8(), Ordering::Release);
        }
    }
}

/// Payload of one logging call, in one of the three call shapes
#[derive(Clone, Copy)]
enum Payload<'a> {
    Positional(&'a [Arg]),
    Template(&'a str, &'a [Arg]),
    Keyed(&'a str, &'a [Arg]),
}

impl Payload<'_> {
    fn message(&self) -> String {
        match *self {
            Payload::Positional(args) | Payload::Template("", args) => render_message(args),
            Payload::Template(template, args) => render_template(template, args),
            Payload::Keyed(msg, _) => msg.to_string(),
        }
    }
}

/// Handle to the logger of one owner.
///
/// Clones share the same instance. Obtain loggers from a
/// [`Registry`](super::registry::Registry) to get one instance per owner;
/// [`Logger::new`] builds a standalone one.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// A logger outside any registry
    pub fn new(identity: impl Into<String>, source: impl ConfigSource + 'static) -> Self {
        Self::with_source(identity, Arc::new(source))
    }

    pub fn with_source(identity: impl Into<String>, source: Arc<dyn ConfigSource>) -> Self {
        Self::registered(identity.into(), source, Weak::new())
    }

    pub(crate) fn registered(
        identity: String,
        source: Arc<dyn ConfigSource>,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                identity,
                source,
                level: AtomicU8::new(LogLevel::Invalid.as_u8()),
                init: OnceCell::new(),
                init_failure_reported: AtomicBool::new(false),
                overrides: Mutex::new(OverrideState::default()),
                registry,
            }),
        }
    }

    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// Whether `other` is a handle to the same instance
    pub fn same_instance(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn initialized(&self) -> Result<&Initialized> {
        match self.inner.init.get_or_init(|| self.inner.initialize()) {
            Ok(init) => Ok(init),
            Err(message) => Err(LoggerError::initialization(
                self.inner.identity.clone(),
                message.clone(),
            )),
        }
    }

    /// Run initialization now instead of at first use
    pub fn init(&self) -> Result<()> {
        self.initialized().map(|_| ())
    }

    /// True once initialization has completed successfully
    pub fn is_initialized(&self) -> bool {
        matches!(self.inner.init.get(), Some(Ok(_)))
    }

    #[inline]
    fn current_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::Acquire))
    }

    /// Current effective level, initializing the logger if needed
    pub fn level(&self) -> Result<LogLevel> {
        self.initialized()?;
        Ok(self.current_level())
    }

    /// Whether a record at `level` would be written
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.is_valid() && self.initialized().is_ok() && level >= self.current_level()
    }

    /// Permanently set the level.
    ///
    /// Cancels a pending temporary override; its rollback will not run.
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.temporary_set_level(level, Duration::ZERO)
    }

    /// Set the level for `duration`, then restore the level that was in
    /// effect before the first override of the current chain.
    ///
    /// A call while another override is pending supersedes it and restarts
    /// the clock. A zero duration makes the change permanent.
    pub fn temporary_set_level(&self, level: LogLevel, duration: Duration) -> Result<()> {
        if !level.is_valid() {
            return Err(LoggerError::InvalidLevel(format!(
                "cannot set '{}' to {}",
                self.inner.identity, level
            )));
        }
        self.initialized()?;

        let mut state = self.inner.overrides.lock();
        let current = self.current_level();

        let scheduled = if duration.is_zero() {
            None
        } else {
            state.next_generation += 1;
            let generation = state.next_generation;
            let weak = Arc::downgrade(&self.inner);
            let timer = RollbackTimer::schedule(duration, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.rollback(generation);
                }
            })?;
            Some(PendingRollback {
                generation,
                _timer: timer,
            })
        };

        // Dropping the superseded rollback cancels its timer
        let origin = match state.pending.take() {
            Some(_) => state.origin_level.take().unwrap_or(current),
            None => current,
        };

        match scheduled {
            Some(pending) => {
                state.origin_level = Some(origin);
                state.pending = Some(pending);
            }
            None => state.origin_level = None,
        }

        self.inner.level.store(level.as_u8(), Ordering::Release);
        Ok(())
    }

    /// Whether a temporary override is waiting to roll back
    pub fn has_pending_override(&self) -> bool {
        self.inner.overrides.lock().pending.is_some()
    }

    /// Attach another destination to this logger
    pub fn add_appender(&self, appender: Box<dyn Appender>) -> Result<()> {
        self.initialized()?.router.lock().add_appender(appender);
        Ok(())
    }

    /// Observe every record this logger writes.
    ///
    /// Hooks run after the sinks, outside the logger's lock, so a hook may
    /// log through this same logger. Records it writes reach the hook again.
    pub fn add_hook<F>(&self, hook: F) -> Result<()>
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.initialized()?.router.lock().add_hook(Arc::new(hook));
        Ok(())
    }

    /// Flush the sinks, returning the first write or flush error since the
    /// last sync
    pub fn sync(&self) -> Result<()> {
        self.initialized()?.router.lock().flush()
    }

    /// Flush without triggering initialization
    pub(crate) fn sync_if_initialized(&self) -> Option<Result<()>> {
        match self.inner.init.get() {
            Some(Ok(init)) => Some(init.router.lock().flush()),
            _ => None,
        }
    }

    /// Log `args` joined with spaces
    #[track_caller]
    pub fn log(&self, level: LogLevel, args: &[Arg]) {
        self.report(self.try_log(level, args));
    }

    /// Log `template` with `{}` placeholders filled from `args`
    #[track_caller]
    pub fn logf(&self, level: LogLevel, template: &str, args: &[Arg]) {
        self.report(self.try_logf(level, template, args));
    }

    /// Log `msg` with alternating key/value context
    #[track_caller]
    pub fn logw(&self, level: LogLevel, msg: &str, args: &[Arg]) {
        self.report(self.try_logw(level, msg, args));
    }

    #[track_caller]
    pub fn try_log(&self, level: LogLevel, args: &[Arg]) -> Result<()> {
        self.dispatch(level, Payload::Positional(args), Location::caller())
    }

    #[track_caller]
    pub fn try_logf(&self, level: LogLevel, template: &str, args: &[Arg]) -> Result<()> {
        self.dispatch(level, Payload::Template(template, args), Location::caller())
    }

    #[track_caller]
    pub fn try_logw(&self, level: LogLevel, msg: &str, args: &[Arg]) -> Result<()> {
        self.dispatch(level, Payload::Keyed(msg, args), Location::caller())
    }

    /// Write a preformatted message; used by the logging macros
    #[track_caller]
    pub fn log_message(&self, level: LogLevel, message: String) {
        let arg = Arg::Str(message);
        self.report(self.dispatch(
            level,
            Payload::Positional(std::slice::from_ref(&arg)),
            Location::caller(),
        ));
    }

    fn dispatch(
        &self,
        level: LogLevel,
        payload: Payload<'_>,
        location: &'static Location<'static>,
    ) -> Result<()> {
        if !level.is_valid() {
            return Err(LoggerError::InvalidLevel(format!(
                "cannot write a record at {}",
                level
            )));
        }
        let init = match self.initialized() {
            Ok(init) => init,
            Err(e) => {
                if level.is_terminal() {
                    eprintln!("[LOGGER ERROR] {}", e);
                    self.escalate(level, None, &payload.message());
                }
                return Err(e);
            }
        };
        let current = self.current_level();
        if level < current {
            if level.is_terminal() {
                self.escalate(level, Some(init), &payload.message());
            }
            return Ok(());
        }

        let fields = match payload {
            Payload::Keyed(_, args) => {
                let sweetened = sweeten(args);
                if LogLevel::Error >= current {
                    for diagnostic in sweetened.diagnostics {
                        self.write(
                            init,
                            LogLevel::Error,
                            diagnostic.message,
                            diagnostic.fields,
                            location,
                        );
                    }
                }
                sweetened.fields
            }
            _ => Vec::new(),
        };
        let message = payload.message();

        self.write(init, level, &message, fields, location);

        if level.is_terminal() {
            self.escalate(level, Some(init), &message);
        }
        Ok(())
    }

    /// Critical flushes this logger and panics; Fatal flushes the registry
    /// and exits with status 1
    fn escalate(&self, level: LogLevel, init: Option<&Initialized>, message: &str) -> ! {
        if level == LogLevel::Fatal {
            self.flush_all();
            std::process::exit(1);
        }
        if let Some(init) = init {
            if let Err(e) = init.router.lock().flush() {
                eprintln!("[LOGGER ERROR] Flush before critical abort failed: {}", e);
            }
        }
        panic!("{}", message);
    }

    fn write(
        &self,
        init: &Initialized,
        level: LogLevel,
        message: &str,
        fields: Vec<Field>,
        location: &'static Location<'static>,
    ) {
        let entry = LogEntry::new(level, message)
            .with_logger_name(init.name.clone())
            .with_caller(
                init.with_caller
                    .then(|| CallerInfo::from_location(location)),
            )
            .with_fields(fields);

        let hooks = {
            let mut router = init.router.lock();
            router.write(&entry);
            router.hooks()
        };
        run_hooks(&hooks, &entry);
    }

    /// Best-effort flush of every logger sharing this one's registry
    fn flush_all(&self) {
        let result = match self.inner.registry.upgrade() {
            Some(registry) => registry.sync_all(),
            None => self.sync_if_initialized().unwrap_or(Ok(())),
        };
        if let Err(e) = result {
            eprintln!("[LOGGER ERROR] Flush before fatal exit failed: {}", e);
        }
    }

    fn report(&self, result: Result<()>) {
        match result {
            Ok(()) => {}
            Err(e @ LoggerError::Initialization { .. }) => {
                if !self.inner.init_failure_reported.swap(true, Ordering::Relaxed) {
                    eprintln!("[LOGGER ERROR] {}. Records from this logger are dropped.", e);
                }
            }
            Err(e) => eprintln!("[LOGGER ERROR] {}", e),
        }
    }
}

macro_rules! level_verbs {
    ($($level:ident => $plain:ident, $templated:ident, $keyed:ident;)+) => {
        impl Logger {
            $(
                #[doc = concat!("`", stringify!($level), "` record from positional arguments")]
                #[track_caller]
                pub fn $plain(&self, args: &[Arg]) {
                    self.log(LogLevel::$level, args);
                }

                #[doc = concat!("`", stringify!($level), "` record from a `{}` template")]
                #[track_caller]
                pub fn $templated(&self, template: &str, args: &[Arg]) {
                    self.logf(LogLevel::$level, template, args);
                }

                #[doc = concat!("`", stringify!($level), "` record with key/value context")]
                #[track_caller]
                pub fn $keyed(&self, msg: &str, args: &[Arg]) {
                    self.logw(LogLevel::$level, msg, args);
                }
            )+
        }
    };
}

level_verbs! {
    Debug => debug, debugf, debugw;
    Info => info, infof, infow;
    Warn => warn, warnf, warnw;
    Error => error, errorf, errorw;
    Critical => critical, criticalf, criticalw;
    Fatal => fatal, fatalf, fatalw;
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("identity", &self.inner.identity)
            .field("level", &self.current_level())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
