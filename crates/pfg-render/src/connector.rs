/// Colour and line-width changes held back while a node is being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deferred {
    pub colour: bool,
    pub line_width: bool,
}

impl Deferred {
    pub fn is_empty(&self) -> bool {
        !self.colour && !self.line_width
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectorState {
    #[default]
    Idle,
    Connecting,
}

/// Connect-node state machine shared by every backend.
///
/// Between `start_node` and `end_node` the backend is emitting one connected
/// segment, so colour and width changes are deferred until `end_node`.
#[derive(Debug, Clone, Default)]
pub struct NodeConnector {
    state: ConnectorState,
    pending: Deferred,
}

impl NodeConnector {
    pub fn state(&self) -> ConnectorState {
        self.state
    }

    pub fn is_connecting(&self) -> bool {
        self.state == ConnectorState::Connecting
    }

    /// Returns `true` when this starts a new connection.
    pub fn start_node(&mut self) -> bool {
        let fresh = self.state == ConnectorState::Idle;
        self.state = ConnectorState::Connecting;
        fresh
    }

    /// Finish the segment and hand back the changes that were deferred.
    pub fn end_node(&mut self) -> Deferred {
        self.state = ConnectorState::Idle;
        std::mem::take(&mut self.pending)
    }

    /// Returns `true` when the colour may be applied now.
    pub fn request_colour(&mut self) -> bool {
        if self.is_connecting() {
            self.pending.colour = true;
            false
        } else {
            true
        }
    }

    /// Returns `true` when the line width may be applied now.
    pub fn request_line_width(&mut self) -> bool {
        if self.is_connecting() {
            self.pending.line_width = true;
            false
        } else {
            true
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
