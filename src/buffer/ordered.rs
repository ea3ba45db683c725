//! Index-ordered view over the entries of a buffer.
//!
//! Entries are stored once, in submission order, by the owning buffer. This
//! module threads a doubly linked list through them (node id == position in
//! the entry vector) sorted by [`Index::after`], and maintains the frontier:
//! the last node known to be preceded by a gap-free run of indices starting
//! at `[0]`. Value iterators never read past the frontier.

use crate::entry::Entry;
use crate::index::Index;

#[derive(Clone, Copy, Debug)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

/// The index expected next, plus the declared bound of every level on the
/// way down to it.
#[derive(Debug)]
struct Frontier {
    next: Index,
    bounds: Vec<Option<usize>>,
}

impl Frontier {
    fn start() -> Self {
        Self {
            next: Index::default().next(None, 0),
            bounds: vec![None],
        }
    }

    fn advance<T>(&mut self, e: &Entry<T>) {
        let depth = e.index.depth();
        self.bounds.resize(depth, None);
        if let Some(level) = self.bounds.last_mut() {
            *level = e.max_index;
        }
        self.next = e.index.next(e.max_index, e.max_sub);
        if e.max_sub > 0 {
            self.bounds.push(Some(e.max_sub));
            return;
        }
        // `Index::next` ascends at most one level; a subtree may close
        // several levels at once.
        loop {
            let depth = self.next.depth();
            self.bounds.truncate(depth);
            if depth < 2 {
                break;
            }
            match (self.bounds.get(depth - 1).copied().flatten(), self.next.last()) {
                (Some(max), Some(last)) if last >= max => self.next = self.next.ascend(),
                _ => break,
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct OrderedList {
    links: Vec<Link>,
    head: Option<usize>,
    tail: Option<usize>,
    valid: Option<usize>,
    frontier: Frontier,
}

impl OrderedList {
    pub(crate) fn new() -> Self {
        Self {
            links: Vec::new(),
            head: None,
            tail: None,
            valid: None,
            frontier: Frontier::start(),
        }
    }

    /// Link `entries[id]` (just appended) into the list and advance the
    /// frontier. Returns whether the frontier moved.
    pub(crate) fn insert<T>(&mut self, entries: &[Entry<T>], id: usize) -> bool {
        debug_assert_eq!(self.links.len(), id, "entries must be linked in submission order");
        let index = &entries[id].index;

        let mut at = self.tail;
        while let Some(c) = at {
            if entries[c].index.after(index) {
                at = self.links[c].prev;
            } else {
                break;
            }
        }
        let next = match at {
            Some(a) => self.links[a].next,
            None => self.head,
        };
        self.links.push(Link { prev: at, next });
        match at {
            Some(a) => self.links[a].next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.links[n].prev = Some(id),
            None => self.tail = Some(id),
        }

        let mut advanced = false;
        while let Some(candidate) = self.successor(self.valid) {
            let e = &entries[candidate];
            if e.index.after(&self.frontier.next) {
                break;
            }
            self.frontier.advance(e);
            self.valid = Some(candidate);
            advanced = true;
        }
        advanced
    }

    /// Expose everything linked so far, gaps included.
    pub(crate) fn close<T>(&mut self, entries: &[Entry<T>]) {
        if self.valid != self.tail {
            self.valid = self.tail;
            if let Some(t) = self.tail {
                self.frontier.next = entries[t].index.clone();
            }
        }
    }

    /// The node following `node` (`None` = the list root).
    pub(crate) fn successor(&self, node: Option<usize>) -> Option<usize> {
        match node {
            None => self.head,
            Some(n) => self.links.get(n).and_then(|l| l.next),
        }
    }

    /// The last confirmed node (`None` while nothing is confirmed).
    pub(crate) fn frontier(&self) -> Option<usize> {
        self.valid
    }

    /// The `i`-th node in index order.
    pub(crate) fn nth(&self, i: usize) -> Option<usize> {
        let mut node = self.head;
        for _ in 0..i {
            node = self.successor(node);
            node?;
        }
        node
    }

    #[cfg(test)]
    fn expected(&self) -> &Index {
        &self.frontier.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push<T>(list: &mut OrderedList, entries: &mut Vec<Entry<T>>, e: Entry<T>) -> bool {
        entries.push(e);
        let id = entries.len() - 1;
        list.insert(entries, id)
    }

    fn order<T: Clone>(list: &OrderedList, entries: &[Entry<T>]) -> Vec<Index> {
        let mut out = Vec::new();
        let mut node = list.successor(None);
        while let Some(n) = node {
            out.push(entries[n].index.clone());
            node = list.successor(Some(n));
        }
        out
    }

    #[test]
    fn starts_expecting_first_top_level_index() {
        let list = OrderedList::new();
        assert_eq!(list.expected(), &Index::top(0));
        assert_eq!(list.frontier(), None);
    }

    #[test]
    fn out_of_order_inserts_are_linked_in_index_order() {
        let mut list = OrderedList::new();
        let mut entries = Vec::new();
        assert!(!push(&mut list, &mut entries, Entry::top(2, 'c')));
        assert!(!push(&mut list, &mut entries, Entry::top(1, 'b')));
        assert!(push(&mut list, &mut entries, Entry::top(0, 'a')));

        assert_eq!(order(&list, &entries), vec![Index::top(0), Index::top(1), Index::top(2)]);
        assert_eq!(list.frontier(), Some(0));
        assert_eq!(list.expected(), &Index::top(3));
    }

    #[test]
    fn nested_explosion_closes_all_levels() {
        let mut list = OrderedList::new();
        let mut entries = Vec::new();
        let parent = Entry::builder(Index::top(0), 0).sub_entries(1).build();
        let child = Entry::builder([0, 0], 1).max_index(1).sub_entries(2).build();
        let g0 = Entry::builder([0, 0, 0], 2).max_index(2).build();
        let g1 = Entry::builder([0, 0, 1], 3).max_index(2).build();

        assert!(push(&mut list, &mut entries, parent));
        assert!(push(&mut list, &mut entries, child));
        assert!(push(&mut list, &mut entries, g0));
        assert!(push(&mut list, &mut entries, g1));
        assert_eq!(list.expected(), &Index::top(1));

        assert!(push(&mut list, &mut entries, Entry::top(1, 4)));
        assert_eq!(list.frontier(), Some(4));
    }

    #[test]
    fn close_exposes_gapped_tail() {
        let mut list = OrderedList::new();
        let mut entries = Vec::new();
        assert!(!push(&mut list, &mut entries, Entry::top(3, 'd')));
        list.close(&entries);
        assert_eq!(list.frontier(), Some(0));
        assert_eq!(list.expected(), &Index::top(3));
    }

    #[test]
    fn nth_walks_index_order() {
        let mut list = OrderedList::new();
        let mut entries = Vec::new();
        push(&mut list, &mut entries, Entry::top(1, 'b'));
        push(&mut list, &mut entries, Entry::top(0, 'a'));
        assert_eq!(list.nth(0), Some(1));
        assert_eq!(list.nth(1), Some(0));
        assert_eq!(list.nth(2), None);
    }
}
