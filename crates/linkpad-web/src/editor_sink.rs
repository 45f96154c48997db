#![forbid(unsafe_code)]

//! [`DropSink`] adapter that feeds palette drops into an [`Editor`].

use linkpad_core::{DropPreview, Editor, NodeKind, Rect};

use crate::drop_target::{DragOverEvent, DropSink, DropSinkError};

/// Routes drag events to an editor whose canvas is the element `canvas`.
///
/// Hover positions are translated from viewport coordinates into canvas
/// coordinates using `canvas_rect`.
#[derive(Debug)]
pub struct EditorDropSink<'a, E> {
    editor: &'a mut Editor,
    canvas: E,
    canvas_rect: Rect,
}

impl<'a, E: PartialEq> EditorDropSink<'a, E> {
    pub fn new(editor: &'a mut Editor, canvas: E, canvas_rect: Rect) -> Self {
        Self {
            editor,
            canvas,
            canvas_rect,
        }
    }

    #[must_use]
    pub fn editor(&self) -> &Editor {
        &*self.editor
    }
}

impl<E: PartialEq> DropSink<E> for EditorDropSink<'_, E> {
    fn accepts(&self, element: &E) -> bool {
        *element == self.canvas
    }

    fn drag_over(&mut self, event: &DragOverEvent, kind: NodeKind) -> Result<(), DropSinkError> {
        self.editor.set_drop_preview(Some(DropPreview {
            kind,
            position: self.canvas_rect.offset_of(event.position),
        }));
        Ok(())
    }

    fn drag_leave(&mut self) -> Result<(), DropSinkError> {
        self.editor.set_drop_preview(None);
        Ok(())
    }

    fn drop(&mut self, kind: NodeKind) -> Result<(), DropSinkError> {
        match self.editor.commit_drop() {
            Some(node) => tracing::debug!(%kind, index = node.index(), "palette drop committed"),
            None => tracing::debug!(%kind, "palette drop outside canvas"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpad_core::{GraphState, Point};

    fn event_at(x: f64, y: f64) -> DragOverEvent {
        DragOverEvent {
            pointer_id: 1,
            position: Point::new(x, y),
            ghost_rect: Rect::new(x, y, 10.0, 10.0),
        }
    }

    #[test]
    fn hover_sets_canvas_local_preview_and_drop_commits() {
        let mut editor = Editor::new(GraphState::default());
        {
            let canvas_rect = Rect::new(200.0, 50.0, 400.0, 400.0);
            let mut sink = EditorDropSink::new(&mut editor, "canvas", canvas_rect);
            assert!(sink.accepts(&"canvas"));
            assert!(!sink.accepts(&"palette"));
            sink.drag_over(&event_at(250.0, 80.0), NodeKind::Clamped).expect("infallible");
            assert_eq!(
                sink.editor().drop_preview(),
                Some(DropPreview {
                    kind: NodeKind::Clamped,
                    position: Point::new(50.0, 30.0),
                })
            );
            sink.drop(NodeKind::Clamped).expect("infallible");
        }
        assert_eq!(editor.state().nodes.len(), 1);
        assert_eq!(editor.state().nodes[0].position(), Point::new(50.0, 30.0));
        assert_eq!(editor.drop_preview(), None);
    }

    #[test]
    fn drop_after_leave_adds_nothing() {
        let mut editor = Editor::new(GraphState::default());
        let mut sink = EditorDropSink::new(&mut editor, 7u32, Rect::new(0.0, 0.0, 100.0, 100.0));
        sink.drag_over(&event_at(5.0, 5.0), NodeKind::Fixed).expect("infallible");
        sink.drag_leave().expect("infallible");
        sink.drop(NodeKind::Fixed).expect("infallible");
        assert!(editor.state().nodes.is_empty());
    }
}
