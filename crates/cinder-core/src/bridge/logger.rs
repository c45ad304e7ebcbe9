/// Structured launch log stream surfaced to the shell for diagnostics
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Section header ("Env Map", "JVM Args", ...)
    Title(String),
    Line(String),
}

pub type LogSink = Arc<dyn Fn(LogEvent) + Send + Sync + 'static>;

/// Fans launch diagnostics out to the `log` facade and, when the shell
/// attached one, a structured sink it can render in its log screen.
#[derive(Clone, Default)]
pub struct LaunchLogger {
    sink: Option<LogSink>,
}

impl LaunchLogger {
    pub fn new(sink: Option<LogSink>) -> Self {
        Self { sink }
    }

    pub fn title(&self, title: &str) {
        log::info!("==== {} ====", title);
        if let Some(sink) = &self.sink {
            sink(LogEvent::Title(title.to_string()));
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);
        if let Some(sink) = &self.sink {
            sink(LogEvent::Line(line));
        }
    }
}

impl std::fmt::Debug for LaunchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchLogger")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn events_reach_the_sink_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let logger = LaunchLogger::new(Some(Arc::new(move |ev| {
            seen2.lock().unwrap().push(ev);
        })));

        logger.title("Env Map");
        logger.line("Added env: JAVA_HOME = /tmp/jre");

        let events = seen.lock().unwrap();
        assert_eq!(events[0], LogEvent::Title("Env Map".to_string()));
        assert_eq!(
            events[1],
            LogEvent::Line("Added env: JAVA_HOME = /tmp/jre".to_string())
        );
    }

    #[test]
    fn no_sink_is_fine() {
        let logger = LaunchLogger::default();
        logger.title("t");
        logger.line("l");
    }
}
