use atc_model::AirportEvent;

use crate::sink::backend::EventSink;

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn emit(&self, _: &AirportEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use atc_model::PlaneId;

    #[test]
    fn noop_sink_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpSink>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let sink = NoOpSink;
        for i in 0..1000 {
            sink.emit(&AirportEvent::DepartureRequested { plane: PlaneId(i) });
        }
    }
}
