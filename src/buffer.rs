// ABOUTME: A lazy, restorable stream over any iterator, used by the parser for backtracking

/// Wraps any iterator, remembering every element it has yielded so a caller
/// can mark a position and, if parsing down that branch fails, restore back
/// to it and try another alternative.
///
/// Marks nest: `mark()` pushes the current position, `restore()` pops it and
/// rewinds, and `commit()` pops it without rewinding. Elements behind the
/// read position are retained only while at least one mark is active, at
/// which point `compact()` can drop them.
pub struct MarkedBuffer<I: Iterator> {
    source: I,
    buffered: Vec<I::Item>,
    position: usize,
    marks: Vec<usize>,
}

impl<I: Iterator> MarkedBuffer<I>
where
    I::Item: Clone,
{
    pub fn new(source: I) -> Self {
        MarkedBuffer {
            source,
            buffered: Vec::new(),
            position: 0,
            marks: Vec::new(),
        }
    }

    /// Record the current position as a new, nested mark.
    pub fn mark(&mut self) {
        self.marks.push(self.position);
    }

    /// Rewind to the most recent mark and pop it.
    pub fn restore(&mut self) {
        let mark = self
            .marks
            .pop()
            .expect("restore() called without a matching mark()");
        self.position = mark;
    }

    /// Pop the most recent mark without rewinding — the scope succeeded.
    pub fn commit(&mut self) {
        self.marks.pop().expect("commit() called without a matching mark()");
    }

    /// Peek at the next element without advancing the position.
    pub fn peek(&mut self) -> Option<&I::Item> {
        self.ensure_buffered(self.position);
        self.buffered.get(self.position)
    }

    /// Read and advance past the next element.
    pub fn next(&mut self) -> Option<I::Item> {
        self.ensure_buffered(self.position);
        let item = self.buffered.get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    /// True iff no more elements remain.
    pub fn is_exhausted(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Drop buffered elements that are no longer reachable by any active
    /// mark, freeing memory held only for backtracking.
    pub fn compact(&mut self) {
        if self.marks.is_empty() {
            let keep_from = self.position;
            self.buffered.drain(0..keep_from);
            self.position = 0;
        }
    }

    fn ensure_buffered(&mut self, index: usize) {
        while self.buffered.len() <= index {
            match self.source.next() {
                Some(item) => self.buffered.push(item),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_order() {
        let mut buf = MarkedBuffer::new(vec![1, 2, 3].into_iter());
        assert_eq!(buf.next(), Some(1));
        assert_eq!(buf.next(), Some(2));
        assert_eq!(buf.next(), Some(3));
        assert_eq!(buf.next(), None);
    }

    #[test]
    fn restore_rewinds_to_mark() {
        let mut buf = MarkedBuffer::new(vec![1, 2, 3].into_iter());
        buf.next();
        buf.mark();
        assert_eq!(buf.next(), Some(2));
        assert_eq!(buf.next(), Some(3));
        buf.restore();
        assert_eq!(buf.next(), Some(2));
        assert_eq!(buf.next(), Some(3));
    }

    #[test]
    fn nested_marks_restore_independently() {
        let mut buf = MarkedBuffer::new(vec![1, 2, 3, 4].into_iter());
        buf.mark();
        buf.next();
        buf.mark();
        buf.next();
        buf.restore(); // back to position 1
        assert_eq!(buf.next(), Some(2));
        buf.restore(); // back to position 0
        assert_eq!(buf.next(), Some(1));
    }

    #[test]
    fn commit_keeps_position_and_drops_mark() {
        let mut buf = MarkedBuffer::new(vec![1, 2].into_iter());
        buf.mark();
        buf.next();
        buf.commit();
        assert_eq!(buf.next(), Some(2));
    }

    #[test]
    fn compact_drops_unreachable_elements_when_unmarked() {
        let mut buf = MarkedBuffer::new(vec![1, 2, 3].into_iter());
        buf.next();
        buf.next();
        buf.compact();
        assert_eq!(buf.buffered.len(), 1);
        assert_eq!(buf.next(), Some(3));
    }
}
