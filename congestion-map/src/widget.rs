//! # Map widget boundary
//!
//! The rendering engine is external. The core only creates lines, restyles them,
//! removes them, and opens popups; pointer events come back in as [`SegmentEvent`]s.

use crate::catalog::SegmentKey;
use crate::style::SegmentStyle;
use geo::{Coord, LineString};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WidgetError {
    #[error("Map container is missing")]
    ContainerMissing,
    #[error("Map widget failed to initialize: {0}")]
    WidgetInitFailed(String),
    #[error("Map widget rejected line: {0}")]
    LineRejected(String),
}

/// An interactive map that can draw styled polylines.
pub trait MapWidget {
    /// Opaque reference to a drawn line.
    type Handle: Clone + Debug;

    /// Checks that the widget can draw.
    ///
    /// # Errors
    ///
    /// [`WidgetError::ContainerMissing`] or [`WidgetError::WidgetInitFailed`].
    /// Both are fatal for the session.
    fn ready(&self) -> Result<(), WidgetError>;

    /// Draws a line and registers pointer callbacks for it under `key`.
    ///
    /// # Errors
    ///
    /// [`WidgetError::LineRejected`] if this particular line can't be drawn.
    fn create_line(
        &mut self,
        key: &SegmentKey,
        path: &LineString,
        style: &SegmentStyle,
    ) -> Result<Self::Handle, WidgetError>;

    fn set_style(&mut self, handle: &Self::Handle, style: &SegmentStyle);

    fn remove_line(&mut self, handle: &Self::Handle);

    /// Opens a detail popup at `at`. The content is already HTML-escaped.
    fn open_popup(&mut self, at: Coord, html: &str);
}

/// Pointer interaction with a drawn segment, as reported by the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEvent {
    PointerEnter(SegmentKey),
    PointerLeave(SegmentKey),
    Click { key: SegmentKey, at: Coord },
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    pub enum WidgetCall {
        Create {
            key: String,
            points: usize,
            style: SegmentStyle,
        },
        SetStyle { handle: usize, style: SegmentStyle },
        Remove { handle: usize },
        Popup { at: Coord, html: String },
    }

    /// Records every call; handles are indexes into `keys`.
    #[derive(Debug, Default)]
    pub struct RecordingWidget {
        pub calls: Vec<WidgetCall>,
        pub keys: Vec<String>,
        pub reject: HashSet<String>,
        pub missing_container: bool,
    }

    impl RecordingWidget {
        pub fn rejecting(keys: &[&str]) -> Self {
            Self {
                reject: keys.iter().map(ToString::to_string).collect(),
                ..Self::default()
            }
        }

        pub fn style_writes(&self) -> Vec<(&str, SegmentStyle)> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    WidgetCall::SetStyle { handle, style } => {
                        Some((self.keys[*handle].as_str(), *style))
                    }
                    _ => None,
                })
                .collect()
        }

        pub fn popups(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    WidgetCall::Popup { html, .. } => Some(html.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn clear_calls(&mut self) {
            self.calls.clear();
        }
    }

    impl MapWidget for RecordingWidget {
        type Handle = usize;

        fn ready(&self) -> Result<(), WidgetError> {
            if self.missing_container {
                Err(WidgetError::ContainerMissing)
            } else {
                Ok(())
            }
        }

        fn create_line(
            &mut self,
            key: &SegmentKey,
            path: &LineString,
            style: &SegmentStyle,
        ) -> Result<usize, WidgetError> {
            let key = key.to_string();
            if self.reject.contains(&key) {
                return Err(WidgetError::LineRejected(key));
            }
            self.calls.push(WidgetCall::Create {
                key: key.clone(),
                points: path.0.len(),
                style: *style,
            });
            self.keys.push(key);
            Ok(self.keys.len() - 1)
        }

        fn set_style(&mut self, handle: &usize, style: &SegmentStyle) {
            self.calls.push(WidgetCall::SetStyle {
                handle: *handle,
                style: *style,
            });
        }

        fn remove_line(&mut self, handle: &usize) {
            self.calls.push(WidgetCall::Remove { handle: *handle });
        }

        fn open_popup(&mut self, at: Coord, html: &str) {
            self.calls.push(WidgetCall::Popup {
                at,
                html: html.to_string(),
            });
        }
    }
}
