//! Pan/zoom viewer state and click collection, driven by explicit events.
//!
//! A GUI front-end owns a [`ViewerSession`], forwards every window event to
//! [`ViewerSession::handle`] and stops once it reports [`SessionStatus::Done`].
//! Click coordinates arrive in window space and are stored in full-image
//! space.

use crate::error::CalibrationError;
use fieldgrid_core::Corner;
use serde::{Deserialize, Serialize};

/// Smallest accepted zoom, in percent.
pub const MIN_ZOOM_PERCENT: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerState {
    pub pan_x: i32,
    pub pan_y: i32,
    pub zoom_percent: u32,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            pan_x: 0,
            pan_y: 0,
            zoom_percent: 100,
        }
    }
}

impl ViewerState {
    pub fn set_zoom(&mut self, percent: u32) {
        self.zoom_percent = percent.max(MIN_ZOOM_PERCENT);
    }

    /// Window pixel → full-image pixel, truncating toward zero.
    pub fn to_image(&self, wx: i32, wy: i32) -> Corner {
        let factor = f64::from(self.zoom_percent) / 100.0;
        Corner::new(
            self.pan_x + (f64::from(wx) / factor) as i32,
            self.pan_y + (f64::from(wy) / factor) as i32,
        )
    }

    /// Side length in image pixels of the area a `window_px` window shows.
    pub fn visible_extent(&self, window_px: u32) -> u32 {
        (f64::from(window_px) * 100.0 / f64::from(self.zoom_percent)) as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewerEvent {
    Pan { x: i32, y: i32 },
    Zoom { percent: u32 },
    /// Click in window coordinates.
    Click { x: i32, y: i32 },
    Confirm,
    Close,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Done(Vec<Corner>),
}

/// Click collector with an optional capacity.
#[derive(Clone, Debug)]
pub struct ViewerSession {
    state: ViewerState,
    limit: Option<usize>,
    clicks: Vec<Corner>,
}

impl ViewerSession {
    /// Calibration mode: at most `limit` clicks are kept.
    pub fn bounded(limit: usize) -> Self {
        Self {
            state: ViewerState::default(),
            limit: Some(limit),
            clicks: Vec::with_capacity(limit),
        }
    }

    /// Curation mode: every click is kept.
    pub fn unbounded() -> Self {
        Self {
            state: ViewerState::default(),
            limit: None,
            clicks: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn clicks(&self) -> &[Corner] {
        &self.clicks
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|n| self.clicks.len() >= n)
    }

    pub fn handle(&mut self, event: ViewerEvent) -> Result<SessionStatus, CalibrationError> {
        match event {
            ViewerEvent::Pan { x, y } => {
                self.state.pan_x = x.max(0);
                self.state.pan_y = y.max(0);
            }
            ViewerEvent::Zoom { percent } => self.state.set_zoom(percent),
            ViewerEvent::Click { x, y } => {
                if self.is_full() {
                    log::warn!("click ignored: {} point(s) already selected", self.clicks.len());
                } else {
                    let p = self.state.to_image(x, y);
                    log::info!("saved coordinates {p}");
                    self.clicks.push(p);
                }
            }
            ViewerEvent::Confirm => {
                return Ok(SessionStatus::Done(std::mem::take(&mut self.clicks)));
            }
            ViewerEvent::Close => return Err(CalibrationError::Aborted),
        }
        Ok(SessionStatus::Open)
    }

    /// Feed a whole event stream; running out of events counts as closing.
    pub fn run(
        mut self,
        events: impl IntoIterator<Item = ViewerEvent>,
    ) -> Result<Vec<Corner>, CalibrationError> {
        for event in events {
            if let SessionStatus::Done(clicks) = self.handle(event)? {
                return Ok(clicks);
            }
        }
        Err(CalibrationError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clicks_follow_pan_and_zoom() {
        let mut state = ViewerState {
            pan_x: 100,
            pan_y: 40,
            zoom_percent: 200,
        };
        assert_eq!(state.to_image(51, 20), Corner::new(125, 50));
        state.set_zoom(0);
        assert_eq!(state.zoom_percent, MIN_ZOOM_PERCENT);
        assert_eq!(state.to_image(3, 0), Corner::new(130, 40));
        assert_eq!(state.visible_extent(800), 8000);
    }

    #[test]
    fn bounded_session_keeps_first_clicks() {
        let events = [
            ViewerEvent::Zoom { percent: 50 },
            ViewerEvent::Click { x: 10, y: 10 },
            ViewerEvent::Pan { x: 300, y: 0 },
            ViewerEvent::Click { x: 10, y: 10 },
            ViewerEvent::Click { x: 0, y: 5 },
            ViewerEvent::Click { x: 99, y: 99 },
            ViewerEvent::Confirm,
        ];
        let clicks = ViewerSession::bounded(3).run(events).unwrap();
        assert_eq!(
            clicks,
            vec![Corner::new(20, 20), Corner::new(320, 20), Corner::new(300, 10)]
        );
    }

    #[test]
    fn closing_aborts() {
        let mut session = ViewerSession::unbounded();
        assert_eq!(
            session.handle(ViewerEvent::Click { x: 1, y: 2 }).unwrap(),
            SessionStatus::Open
        );
        assert_eq!(
            session.handle(ViewerEvent::Close).unwrap_err(),
            CalibrationError::Aborted
        );
        assert_eq!(
            ViewerSession::unbounded().run([]).unwrap_err(),
            CalibrationError::Aborted
        );
    }

    #[test]
    fn events_parse_from_json() {
        let events: Vec<ViewerEvent> = serde_json::from_str(
            r#"[{"kind":"pan","x":5,"y":6},{"kind":"click","x":1,"y":1},{"kind":"confirm"}]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], ViewerEvent::Confirm);
    }
}
