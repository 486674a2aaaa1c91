//! Interactive region-selection state machine.
//!
//! The model is a pure reducer: the host routes raw pointer/key input as
//! [`Action`]s and executes the returned [`Effect`]s (overlay preview
//! updates, teardown). One model instance covers one capture session; after
//! reaching a terminal phase it ignores all further input.

use crate::types::{MIN_SELECTION_SIZE, RectI32};

/// Selection lifecycle phase. `Committed` and `Cancelled` are terminal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// A drag is in progress. `live` is the axis-aligned box spanning the
    /// anchor and the latest pointer position.
    Dragging { anchor: (i32, i32), live: RectI32 },
    Committed { selection: RectI32 },
    Cancelled { cause: CancelCause },
}

/// Why a session ended without a selection.
///
/// Both causes land in the same terminal phase; the distinction is kept for
/// observability (hosts may want different messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Final drag rectangle was below [`MIN_SELECTION_SIZE`].
    TooSmall,
    /// User pressed the cancel key.
    Escape,
}

/// Input actions (pure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PointerDown { x: i32, y: i32 },
    PointerMove { x: i32, y: i32 },
    PointerUp { x: i32, y: i32 },
    CancelKey,
}

/// Effects requested by the model (executed by the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Redraw the live selection rectangle on the overlay surface.
    UpdatePreview { selection: RectI32 },
    /// The selection was confirmed; hide the overlay and capture.
    CommitSelection { selection: RectI32 },
    /// The session ended without a selection; tear the overlay down.
    CloseOverlay { cause: CancelCause },
}

/// Region-selection state machine model.
///
/// The overlay surface is expected to cover the full virtual screen with its
/// origin at the virtual-screen origin, so pointer coordinates are directly
/// usable as capture coordinates.
#[derive(Debug, Default)]
pub struct Model {
    phase: Phase,
}

impl Model {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            Phase::Committed { .. } | Phase::Cancelled { .. }
        )
    }

    /// Final rectangle, once the session committed.
    pub fn committed_selection(&self) -> Option<RectI32> {
        match self.phase {
            Phase::Committed { selection } => Some(selection),
            _ => None,
        }
    }

    /// Cancellation cause, once the session cancelled.
    pub fn cancel_cause(&self) -> Option<CancelCause> {
        match self.phase {
            Phase::Cancelled { cause } => Some(cause),
            _ => None,
        }
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        // Terminal phases ignore everything (idempotent).
        if self.is_terminal() {
            return Vec::new();
        }

        match action {
            Action::PointerDown { x, y } => {
                if self.phase != Phase::Idle {
                    return Vec::new();
                }
                // Anchor the live rectangle with zero size at the press point.
                let live = RectI32::from_points(x, y, x, y);
                self.phase = Phase::Dragging {
                    anchor: (x, y),
                    live,
                };
                vec![Effect::UpdatePreview { selection: live }]
            }

            Action::PointerMove { x, y } => {
                let Phase::Dragging { anchor, live } = &mut self.phase else {
                    return Vec::new();
                };
                let updated = RectI32::from_points(anchor.0, anchor.1, x, y);
                if updated == *live {
                    return Vec::new();
                }
                *live = updated;
                vec![Effect::UpdatePreview { selection: updated }]
            }

            Action::PointerUp { x, y } => {
                let Phase::Dragging { anchor, .. } = &self.phase else {
                    return Vec::new();
                };
                let anchor = *anchor;
                let selection = RectI32::from_points(anchor.0, anchor.1, x, y);
                if !selection.is_valid_min_size(MIN_SELECTION_SIZE) {
                    self.phase = Phase::Cancelled {
                        cause: CancelCause::TooSmall,
                    };
                    return vec![Effect::CloseOverlay {
                        cause: CancelCause::TooSmall,
                    }];
                }
                self.phase = Phase::Committed { selection };
                vec![Effect::CommitSelection { selection }]
            }

            Action::CancelKey => {
                self.phase = Phase::Cancelled {
                    cause: CancelCause::Escape,
                };
                vec![Effect::CloseOverlay {
                    cause: CancelCause::Escape,
                }]
            }
        }
    }
}
