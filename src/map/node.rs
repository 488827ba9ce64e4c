//! Persistent left-leaning red-black tree: the node shape and the
//! insert/delete/balance algorithms, generalized from the teacher's
//! unsafe, `AtomicPtr`-based `llrb_node::Node`/`mvcc::Mvcc` pair into
//! safe, `Arc`-based copy-on-write.
//!
//! Every mutating path clones the nodes it visits before rewriting
//! their children, so a predecessor root (and any iterator snapshot
//! of it) remains valid and unaffected by later mutation.

use std::cmp::Ordering;
use std::ops::Bound;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Node<V: Clone> {
    pub(crate) key: Vec<u8>,
    pub(crate) value: V,
    red: bool,
    left: Link<V>,
    right: Link<V>,
}

pub(crate) type Link<V> = Option<Arc<Node<V>>>;

fn is_red<V: Clone>(link: &Link<V>) -> bool {
    link.as_ref().map_or(false, |n| n.red)
}

fn rotate_left<V: Clone>(mut h: Node<V>) -> Node<V> {
    let mut x = (*h.right.take().expect("rotate_left needs a right child")).clone();
    h.right = x.left.take();
    x.red = h.red;
    h.red = true;
    x.left = Some(Arc::new(h));
    x
}

fn rotate_right<V: Clone>(mut h: Node<V>) -> Node<V> {
    let mut x = (*h.left.take().expect("rotate_right needs a left child")).clone();
    h.left = x.right.take();
    x.red = h.red;
    h.red = true;
    x.right = Some(Arc::new(h));
    x
}

fn flip_colors<V: Clone>(h: &mut Node<V>) {
    h.red = !h.red;
    if let Some(l) = &h.left {
        let mut l2 = (**l).clone();
        l2.red = !l2.red;
        h.left = Some(Arc::new(l2));
    }
    if let Some(r) = &h.right {
        let mut r2 = (**r).clone();
        r2.red = !r2.red;
        h.right = Some(Arc::new(r2));
    }
}

/// Restore the left-leaning-red, no-consecutive-red, perfect-black
/// invariants after an insert or delete touched `h`.
fn balance<V: Clone>(mut h: Node<V>) -> Node<V> {
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h);
    }
    if is_red(&h.left) && h.left.as_ref().map_or(false, |l| is_red(&l.left)) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colors(&mut h);
    }
    h
}

pub(crate) fn get<V: Clone>(root: &Link<V>, key: &[u8]) -> Option<V> {
    let mut cur = root;
    while let Some(n) = cur {
        match key.cmp(n.key.as_slice()) {
            Ordering::Less => cur = &n.left,
            Ordering::Greater => cur = &n.right,
            Ordering::Equal => return Some(n.value.clone()),
        }
    }
    None
}

fn insert_node<V: Clone>(link: Link<V>, key: &[u8], value: V, old: &mut Option<V>) -> Arc<Node<V>> {
    match link {
        None => Arc::new(Node {
            key: key.to_vec(),
            value,
            red: true,
            left: None,
            right: None,
        }),
        Some(n) => {
            let mut h = (*n).clone();
            match key.cmp(h.key.as_slice()) {
                Ordering::Less => {
                    let left = h.left.take();
                    h.left = Some(insert_node(left, key, value, old));
                }
                Ordering::Greater => {
                    let right = h.right.take();
                    h.right = Some(insert_node(right, key, value, old));
                }
                Ordering::Equal => {
                    *old = Some(h.value.clone());
                    h.value = value;
                }
            }
            Arc::new(balance(h))
        }
    }
}

/// Insert `key -> value`, returning the new root and the previous
/// value, if any.
pub(crate) fn insert<V: Clone>(root: Link<V>, key: &[u8], value: V) -> (Link<V>, Option<V>) {
    let mut old = None;
    let new_root = insert_node(root, key, value, &mut old);
    let new_root = force_black(new_root);
    (Some(new_root), old)
}

fn force_black<V: Clone>(n: Arc<Node<V>>) -> Arc<Node<V>> {
    if n.red {
        let mut n2 = (*n).clone();
        n2.red = false;
        Arc::new(n2)
    } else {
        n
    }
}

fn move_red_left<V: Clone>(mut h: Node<V>) -> Node<V> {
    flip_colors(&mut h);
    if h.right.as_ref().map_or(false, |r| is_red(&r.left)) {
        let right = (*h.right.take().unwrap()).clone();
        h.right = Some(Arc::new(rotate_right(right)));
        h = rotate_left(h);
        flip_colors(&mut h);
    }
    h
}

fn move_red_right<V: Clone>(mut h: Node<V>) -> Node<V> {
    flip_colors(&mut h);
    if h.left.as_ref().map_or(false, |l| is_red(&l.left)) {
        h = rotate_right(h);
        flip_colors(&mut h);
    }
    h
}

fn min_kv<V: Clone>(node: &Arc<Node<V>>) -> (Vec<u8>, V) {
    let mut cur = node;
    loop {
        match &cur.left {
            Some(l) => cur = l,
            None => return (cur.key.clone(), cur.value.clone()),
        }
    }
}

fn delete_min_node<V: Clone>(mut h: Node<V>) -> Link<V> {
    if h.left.is_none() {
        return None;
    }
    if !is_red(&h.left) && !h.left.as_ref().map_or(false, |l| is_red(&l.left)) {
        h = move_red_left(h);
    }
    let left = h.left.take();
    h.left = delete_min_link(left);
    Some(Arc::new(balance(h)))
}

fn delete_min_link<V: Clone>(link: Link<V>) -> Link<V> {
    match link {
        None => None,
        Some(n) => delete_min_node((*n).clone()),
    }
}

fn delete_node<V: Clone>(mut h: Node<V>, key: &[u8], removed: &mut Option<V>) -> Link<V> {
    if key.cmp(h.key.as_slice()) == Ordering::Less {
        if h.left.is_none() {
            // key not present; nothing to do.
            return Some(Arc::new(h));
        }
        if !is_red(&h.left) && !h.left.as_ref().map_or(false, |l| is_red(&l.left)) {
            h = move_red_left(h);
        }
        let left = h.left.take();
        h.left = delete_link(left, key, removed);
    } else {
        if is_red(&h.left) {
            h = rotate_right(h);
        }
        if key.cmp(h.key.as_slice()) == Ordering::Equal && h.right.is_none() {
            *removed = Some(h.value.clone());
            return None;
        }
        if h.right.is_none() {
            // key not present (key > h.key and no right child).
            return Some(Arc::new(h));
        }
        if !is_red(&h.right) && !h.right.as_ref().map_or(false, |r| is_red(&r.left)) {
            h = move_red_right(h);
        }
        if key.cmp(h.key.as_slice()) == Ordering::Equal {
            *removed = Some(h.value.clone());
            let (min_key, min_val) = min_kv(h.right.as_ref().unwrap());
            h.key = min_key;
            h.value = min_val;
            let right = h.right.take();
            h.right = delete_min_link(right);
        } else {
            let right = h.right.take();
            h.right = delete_link(right, key, removed);
        }
    }
    Some(Arc::new(balance(h)))
}

fn delete_link<V: Clone>(link: Link<V>, key: &[u8], removed: &mut Option<V>) -> Link<V> {
    match link {
        None => None,
        Some(n) => delete_node((*n).clone(), key, removed),
    }
}

/// Delete `key`, returning the new root and the removed value, if
/// any.
pub(crate) fn delete<V: Clone>(root: Link<V>, key: &[u8]) -> (Link<V>, Option<V>) {
    match root {
        None => (None, None),
        Some(n) => {
            let mut h = (*n).clone();
            if !is_red(&h.left) && !is_red(&h.right) {
                h.red = true;
            }
            let mut removed = None;
            let new_root = delete_node(h, key, &mut removed);
            let new_root = new_root.map(|n| {
                if n.red {
                    let mut n2 = (*n).clone();
                    n2.red = false;
                    Arc::new(n2)
                } else {
                    n
                }
            });
            (new_root, removed)
        }
    }
}

fn push_left_spine<V: Clone>(mut cur: Link<V>, stack: &mut Vec<Arc<Node<V>>>) {
    while let Some(n) = cur {
        let left = n.left.clone();
        stack.push(n);
        cur = left;
    }
}

fn push_right_spine<V: Clone>(mut cur: Link<V>, stack: &mut Vec<Arc<Node<V>>>) {
    while let Some(n) = cur {
        let right = n.right.clone();
        stack.push(n);
        cur = right;
    }
}

fn push_seek_forward<V: Clone>(mut cur: Link<V>, bound: Bound<&[u8]>, stack: &mut Vec<Arc<Node<V>>>) {
    while let Some(n) = cur {
        let go_right = match bound {
            Bound::Unbounded => false,
            Bound::Included(k) => n.key.as_slice() < k,
            Bound::Excluded(k) => n.key.as_slice() <= k,
        };
        if go_right {
            cur = n.right.clone();
        } else {
            let left = n.left.clone();
            stack.push(n);
            cur = left;
        }
    }
}

fn push_seek_backward<V: Clone>(mut cur: Link<V>, bound: Bound<&[u8]>, stack: &mut Vec<Arc<Node<V>>>) {
    while let Some(n) = cur {
        let go_left = match bound {
            Bound::Unbounded => false,
            Bound::Included(k) => n.key.as_slice() > k,
            Bound::Excluded(k) => n.key.as_slice() >= k,
        };
        if go_left {
            cur = n.left.clone();
        } else {
            let right = n.right.clone();
            stack.push(n);
            cur = right;
        }
    }
}

/// A lazy, stack-based in-order cursor over a snapshot of the tree.
/// Because the tree is persistent, later mutation of the live root
/// never changes the nodes a cursor has already cloned into its
/// stack: the cursor never observes writes made after construction.
pub(crate) struct Cursor<V: Clone> {
    stack: Vec<Arc<Node<V>>>,
    rev: bool,
}

impl<V: Clone> Cursor<V> {
    pub(crate) fn forward(root: &Link<V>, bound: Bound<&[u8]>) -> Cursor<V> {
        let mut stack = Vec::new();
        push_seek_forward(root.clone(), bound, &mut stack);
        Cursor { stack, rev: false }
    }

    pub(crate) fn backward(root: &Link<V>, bound: Bound<&[u8]>) -> Cursor<V> {
        let mut stack = Vec::new();
        push_seek_backward(root.clone(), bound, &mut stack);
        Cursor { stack, rev: true }
    }
}

impl<V: Clone> Iterator for Cursor<V> {
    type Item = (Vec<u8>, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if self.rev {
            push_right_spine(node.left.clone(), &mut self.stack);
        } else {
            push_left_spine(node.right.clone(), &mut self.stack);
        }
        Some((node.key.clone(), node.value.clone()))
    }
}
