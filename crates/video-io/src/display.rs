//! Highgui display window driven by the display stage.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use opencv::{highgui, prelude::*};

use crate::types::{DisplayError, Frame};

const ESCAPE_KEY: i32 = 27;

/// Preview window for annotated frames.
///
/// [`show`](Self::show) rebuilds a BGR `Mat` over the frame bytes, paints
/// it, and pumps the highgui event queue for one millisecond. Key presses
/// arrive on the display thread, so the Escape key is latched into an
/// atomic exit handle that the controlling thread polls as its stop
/// condition.
pub struct DisplayWindow {
    title: String,
    exit_requested: Arc<AtomicBool>,
}

impl DisplayWindow {
    /// Create the named window up front so a model's long load does not
    /// leave the user staring at nothing.
    pub fn create(title: &str) -> Result<Self, DisplayError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(|_| {
            DisplayError::Create {
                title: title.to_string(),
            }
        })?;
        Ok(Self {
            title: title.to_string(),
            exit_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle polled by the controlling thread; set once Escape is pressed.
    pub fn exit_handle(&self) -> Arc<AtomicBool> {
        self.exit_requested.clone()
    }

    /// Paint `frame` and pump window events.
    pub fn show(&self, frame: &Frame) -> Result<(), DisplayError> {
        let expected = frame.expected_len();
        if frame.data.len() != expected {
            return Err(DisplayError::BadGeometry {
                got: frame.data.len(),
                width: frame.width,
                height: frame.height,
                expected,
            });
        }

        let flat = Mat::from_slice(&frame.data).map_err(|e| DisplayError::Other(e.into()))?;
        let image = flat
            .reshape(3, frame.height)
            .map_err(|e| DisplayError::Other(e.into()))?;
        highgui::imshow(&self.title, &image).map_err(|e| DisplayError::Other(e.into()))?;

        let key = highgui::wait_key(1).map_err(|e| DisplayError::Other(e.into()))?;
        if key & 0xFF == ESCAPE_KEY {
            self.exit_requested.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}
