use std::rc::Rc;

/// One frame of the parse stack.
///
/// Frames are linked to the frame below them through an `Rc`. The parser owns
/// its stack exclusively while it runs reductions, so nodes are moved out of
/// popped frames; only scratch branches used to look ahead share frames.
#[derive(Debug)]
pub struct ParserState<N> {
    node: Option<N>,
    state: usize,
    depth: usize,
    parent: Option<Rc<ParserState<N>>>,
}

impl<N> ParserState<N> {
    /// The bottom frame, holding the start state and no node.
    pub(crate) fn root(state: usize) -> Rc<ParserState<N>> {
        Rc::new(ParserState {
            node: None,
            state,
            depth: 0,
            parent: None,
        })
    }

    pub(crate) fn push(
        parent: Rc<ParserState<N>>,
        node: Option<N>,
        state: usize,
    ) -> Rc<ParserState<N>> {
        Rc::new(ParserState {
            node,
            state,
            depth: parent.depth + 1,
            parent: Some(parent),
        })
    }

    /// Unlinks the top frame, returning its node and the frame below.
    ///
    /// Panics if the frame is the root or is still shared.
    pub(crate) fn pop(frame: Rc<ParserState<N>>) -> (Option<N>, Rc<ParserState<N>>) {
        let mut frame = match Rc::try_unwrap(frame) {
            Ok(frame) => frame,
            Err(frame) => panic!("frame in state {} is still shared", frame.state),
        };
        match frame.parent.take() {
            Some(parent) => (frame.node.take(), parent),
            None => panic!("cannot pop the root frame in state {}", frame.state),
        }
    }

    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }
    pub fn state(&self) -> usize {
        self.state
    }
    /// Number of frames above the root.
    pub fn depth(&self) -> usize {
        self.depth
    }
    pub fn parent(&self) -> Option<&ParserState<N>> {
        self.parent.as_deref()
    }
    pub(crate) fn parent_link(&self) -> Option<&Rc<ParserState<N>>> {
        self.parent.as_ref()
    }
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterates from this frame down to the root.
    pub fn iter(&self) -> Frames<'_, N> {
        Frames { next: Some(self) }
    }

    /// The nodes from the root up to this frame.
    pub fn nodes(&self) -> Vec<&N> {
        let mut nodes: Vec<_> = self.iter().filter_map(ParserState::node).collect();
        nodes.reverse();
        nodes
    }
}

pub struct Frames<'a, N> {
    next: Option<&'a ParserState<N>>,
}

impl<'a, N> Iterator for Frames<'a, N> {
    type Item = &'a ParserState<N>;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = cur.parent.as_deref();
        Some(cur)
    }
}

impl<N> Drop for ParserState<N> {
    // Unlink iteratively so a deep stack does not overflow the native one.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(frame) = parent {
            match Rc::try_unwrap(frame) {
                Ok(mut frame) => parent = frame.parent.take(),
                Err(_) => break,
            }
        }
    }
}
