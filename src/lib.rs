//! An intrusive AVL tree.
#![no_std]

// Conventions used in comments:
// - The height of a subtree rooted at `x` is denoted `h(x)`. An empty subtree has height 0 and a
//   leaf has height 1.
// - The balance factor of a node `x` is `b(x) = h(right(x)) - h(left(x))`.
// - A node `x` leans toward its taller side: left if `b(x) < 0`, right if `b(x) > 0`.
//
// The fundamental invariant of an AVL tree is:
// 1. For every node `x`, `b(x) ∈ {-1, 0, 1}`.
//
// Corollaries:
// 2. A node with `b(x) != 0` has a child on the side it leans toward.
// 3. A tree of `n` nodes has height less than `1.4405 * log2(n + 2)`.
//
// During a fix-up walk exactly one node may reach `b(x) = ±2`. The walk resolves it with a single
// or double rotation before returning, so (1) holds again at every public boundary.
//
// Rotations only rewire links. Whoever rotates assigns the resulting balance factors.

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(any(test, feature = "model"))]
extern crate std;

use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not,
    pin::Pin, ptr::NonNull,
};

use cordyceps::Linked;

#[cfg(feature = "alloc")]
mod debug;
mod error;
#[cfg(feature = "alloc")]
mod map;
mod paths;

#[cfg(any(all(test, feature = "std"), feature = "model"))]
pub mod model;

#[cfg(all(test, feature = "std"))]
mod tests;

pub use error::KeyExists;
#[cfg(feature = "alloc")]
pub use map::AvlMap;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Every element embeds a [`Links`] holding its parent, its two children and its balance factor.
/// The tree owns its elements through [`Linked::Handle`]; parent links never own.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The change in balance factor caused by growing the subtree on this side.
    #[inline]
    fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

// Where a key lives, or would be attached, in the tree.
enum Slot<T: ?Sized> {
    Occupied(NonNull<T>),
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree, counted in levels.
    ///
    /// The empty tree has height 0 and a single element has height 1. This follows the taller
    /// side of every node, so it completes in _O(log(n))_ time.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            height += 1;

            let links = unsafe { self.links(cur) };
            opt_cur = if links.balance() < 0 {
                links.left()
            } else {
                links.right()
            };
        }

        height
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree must have length 0");
            return;
        };

        unsafe {
            assert_eq!(
                self.links(root).parent(),
                None,
                "root must not have a parent"
            );

            let (_, count) = self.assert_invariants_at(root, None, None);
            assert_eq!(count, self.len, "tree length must match node count");
        }
    }

    // Checks the subtree rooted at `node`, whose keys must lie strictly between `lower` and
    // `upper`. Returns the height and node count of the subtree.
    unsafe fn assert_invariants_at(
        &self,
        node: NonNull<T>,
        lower: Option<&T::Key>,
        upper: Option<&T::Key>,
    ) -> (isize, usize) {
        unsafe {
            let key = node.as_ref().key();

            if let Some(lower) = lower {
                assert!(lower < key, "keys must increase to the right");
            }

            if let Some(upper) = upper {
                assert!(key < upper, "keys must decrease to the left");
            }

            let mut heights = [0_isize; 2];
            let mut count = 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    assert_eq!(
                        self.links(child).parent(),
                        Some(node),
                        "child's parent pointer must point to its parent"
                    );

                    let (lower, upper) = match dir {
                        Dir::Left => (lower, Some(key)),
                        Dir::Right => (Some(key), upper),
                    };

                    let (height, subtree_count) = self.assert_invariants_at(child, lower, upper);
                    heights[dir as usize] = height;
                    count += subtree_count;
                }
            }

            // Ensure the stored balance factor is the real one, and that it is in range.
            let balance = self.links(node).balance();
            assert_eq!(
                isize::from(balance),
                heights[Dir::Right as usize] - heights[Dir::Left as usize],
                "balance factor must match subtree heights"
            );
            assert!((-1..=1).contains(&balance), "balance factor out of range");

            (1 + heights[0].max(heights[1]), count)
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// The caller must not change the node's key in a way that changes its ordering.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains an element with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find_slot(key) {
            Slot::Occupied(node) => Some(node),
            Slot::Root | Slot::Child { .. } => None,
        }
    }

    fn find_slot<Q>(&self, key: &Q) -> Slot<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Slot::Root;
        };

        loop {
            let dir = match key.cmp(unsafe { cur.as_ref() }.key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Slot::Occupied(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return Slot::Child { parent: cur, dir },
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.extreme(Dir::Left)
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.extreme(Dir::Right)
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.extreme(Dir::Left)?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.extreme(Dir::Right)?;
        Some(unsafe { self.remove_at(last) })
    }

    fn extreme(&self, dir: Dir) -> Link<T> {
        let root = self.root?;
        Some(unsafe { self.extreme_in_subtree(root, dir) })
    }

    // Returns the leftmost or rightmost node in the subtree.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(child) = unsafe { self.links(cur).child(dir) } {
            cur = child;
        }

        cur
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);

            debug_assert_eq!(
                self.links(parent).child(dir),
                Some(old_child),
                "`old_child` must be a child of `parent`"
            );
            debug_assert!(
                new_child.is_none() || self.links(parent).child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    // Rotates `node` down toward `dir`, lifting its child on the other side into its place.
    //
    // `rotate(n, Dir::Right)` is a right rotation: the left child of `n` becomes the subtree
    // root, and its former right child becomes the left child of `n`. If `n` has no child to
    // lift, this does nothing.
    //
    // Balance factors of affected nodes are not updated.
    unsafe fn rotate(&mut self, node: NonNull<T>, dir: Dir) {
        unsafe {
            let Some(up) = self.links(node).child(!dir) else {
                return;
            };

            // `across` goes from the `dir` child of `up` to the `!dir` child of `node`.
            let across = self.links(up).child(dir);
            let parent = self.links(node).parent();

            self.replace_child_or_set_root(parent, node, Some(up));
            self.links_mut(up).set_parent(parent);

            self.links_mut(node).set_child(!dir, across);
            self.maybe_set_parent(across, Some(node));

            self.links_mut(up).set_child(dir, Some(node));
            self.links_mut(node).set_parent(Some(up));
        }
    }

    // Performs a double rotation lifting `pivot` above both `middle` and `top`.
    //
    // `middle` is the `heavy` child of `top`, and `pivot` is the `!heavy` child of `middle`. The
    // balance factors of all three nodes are set from `b(pivot)` before the rotation; `pivot`
    // ends up with a balance factor of 0.
    unsafe fn rotate_twice(
        &mut self,
        top: NonNull<T>,
        middle: NonNull<T>,
        pivot: NonNull<T>,
        heavy: Dir,
    ) {
        unsafe {
            self.rotate(middle, heavy);
            self.rotate(top, !heavy);

            let h = heavy.sign();
            let (top_balance, middle_balance) = match self.links(pivot).balance() {
                b if b == h => (-h, 0),
                0 => (0, 0),
                _ => (0, h),
            };

            self.links_mut(top).set_balance(top_balance);
            self.links_mut(middle).set_balance(middle_balance);
            self.links_mut(pivot).set_balance(0);
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already holds an item with an equal key, `item` takes its place, keeping its
    /// position and balance factor, and the previous item is returned. No rebalancing happens
    /// in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            self.links_mut(ptr).clear();

            match self.find_slot(ptr.as_ref().key()) {
                Slot::Occupied(old) => Some(self.replace_node(old, ptr)),
                Slot::Root => {
                    self.insert_as_root(ptr);
                    None
                }
                Slot::Child { parent, dir } => {
                    self.insert_as_child(parent, dir, ptr);
                    None
                }
            }
        }
    }

    /// Inserts an item into the tree if its key is not already present.
    ///
    /// On success, returns a pinned reference to the inserted item. Otherwise the tree is left
    /// unchanged and `item` is handed back inside the error.
    pub fn try_insert(&mut self, item: T::Handle) -> Result<Pin<&mut T>, KeyExists<T::Handle>> {
        let mut ptr = T::into_ptr(item);

        unsafe {
            self.links_mut(ptr).clear();

            match self.find_slot(ptr.as_ref().key()) {
                Slot::Occupied(_) => return Err(KeyExists::new(T::from_ptr(ptr))),
                Slot::Root => self.insert_as_root(ptr),
                Slot::Child { parent, dir } => self.insert_as_child(parent, dir, ptr),
            }

            Ok(Pin::new_unchecked(ptr.as_mut()))
        }
    }

    unsafe fn insert_as_root(&mut self, node: NonNull<T>) {
        debug_assert!(self.root.is_none());

        self.root = Some(node);
        self.len += 1;
    }

    unsafe fn insert_as_child(&mut self, parent: NonNull<T>, dir: Dir, node: NonNull<T>) {
        unsafe {
            self.links_mut(parent).set_child(dir, Some(node));
            self.links_mut(node).set_parent(Some(parent));
            self.len += 1;

            // If `parent` leaned away from `dir`, it is now level and its height is unchanged.
            // Otherwise it was level, now leans toward `dir`, and grew by one.
            if self.links_mut(parent).update_balance(dir.sign()) != 0 {
                self.insert_fix(parent, node);
            }
        }
    }

    // Performs a bottom-up rebalance of the tree after the subtree rooted at `parent` grew.
    //
    // Invariants:
    // - `node` is a child of `parent`, and `parent` leans toward `node`.
    // - `b(parent)` is -1 or 1.
    unsafe fn insert_fix(&mut self, mut parent: NonNull<T>, mut node: NonNull<T>) {
        unsafe {
            loop {
                let Some(grandparent) = self.links(parent).parent() else {
                    return;
                };

                let dir = self.which_child(grandparent, parent);

                match self.links_mut(grandparent).update_balance(dir.sign()) {
                    // The grandparent absorbed the growth.
                    0 => return,

                    // The grandparent grew too. Ascend.
                    -1 | 1 => {
                        node = parent;
                        parent = grandparent;
                    }

                    // The grandparent is now ±2 toward `dir`.
                    _ => {
                        if self.links(parent).balance() == dir.sign() {
                            self.zig_zig(grandparent, parent, dir);
                        } else {
                            self.rotate_twice(grandparent, parent, node, dir);
                        }

                        // Either rotation restores the subtree's height from before the insert.
                        return;
                    }
                }
            }
        }
    }

    // `parent` is the `dir` child of `grandparent`, and both lean toward `dir`.
    unsafe fn zig_zig(&mut self, grandparent: NonNull<T>, parent: NonNull<T>, dir: Dir) {
        unsafe {
            self.rotate(grandparent, !dir);
            self.links_mut(parent).set_balance(0);
            self.links_mut(grandparent).set_balance(0);
        }
    }

    // Replaces `old` with `new` in the tree. `new` takes over `old`'s links and balance factor.
    unsafe fn replace_node(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            let parent = self.links(old).parent();
            let children = self.links(old).children();
            let balance = self.links(old).balance();

            self.replace_child_or_set_root(parent, old, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_children(children);
            new_links.set_balance(balance);

            for child in children {
                self.maybe_set_parent(child, Some(new));
            }

            self.links_mut(old).clear();
            T::from_ptr(old)
        }
    }

    /// Removes the item with the given key from the tree.
    ///
    /// Returns `None` if no item with the key is present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            // A node with two children first trades places with its predecessor, which by
            // definition has no right child. Either way the node spliced out has at most one child.
            if let (Some(left), Some(_)) = (self.links(node).left(), self.links(node).right()) {
                let predecessor = self.extreme_in_subtree(left, Dir::Right);
                self.swap_nodes(node, predecessor);
            }

            let parent = self.links(node).parent();
            let child = self.links(node).left().or(self.links(node).right());
            let shrunk = parent.map(|parent| self.which_child(parent, node));

            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);
            self.len -= 1;

            if let (Some(parent), Some(shrunk)) = (parent, shrunk) {
                self.remove_fix(parent, shrunk);
            }

            self.links_mut(node).clear();
            T::from_ptr(node)
        }
    }

    // Performs a bottom-up rebalance of the tree after the `shrunk` subtree of `node` lost one
    // level of height.
    unsafe fn remove_fix(&mut self, mut node: NonNull<T>, mut shrunk: Dir) {
        unsafe {
            loop {
                // Where to continue, captured before any rotation moves `node`.
                let next = self
                    .links(node)
                    .parent()
                    .map(|parent| (parent, self.which_child(parent, node)));

                let heavy = !shrunk;
                let h = heavy.sign();
                let balance = self.links(node).balance() + h;

                if balance == 2 * h {
                    let child = self
                        .links(node)
                        .child(heavy)
                        .expect("a node leaning toward a side must have a child there");

                    match self.links(child).balance() {
                        b if b == h => {
                            self.rotate(node, shrunk);
                            self.links_mut(node).set_balance(0);
                            self.links_mut(child).set_balance(0);
                        }

                        0 => {
                            // The subtree keeps its height. Stop.
                            self.rotate(node, shrunk);
                            self.links_mut(node).set_balance(h);
                            self.links_mut(child).set_balance(-h);
                            return;
                        }

                        _ => {
                            let grandchild = self
                                .links(child)
                                .child(shrunk)
                                .expect("a node leaning toward a side must have a child there");
                            self.rotate_twice(node, child, grandchild, heavy);
                        }
                    }
                } else if balance == h {
                    // `node` was level; the other side still holds its height. Stop.
                    self.links_mut(node).set_balance(h);
                    return;
                } else {
                    debug_assert_eq!(balance, 0);
                    self.links_mut(node).set_balance(0);
                }

                // The subtree formerly rooted at `node` shrank. Ascend.
                match next {
                    Some((parent, dir)) => {
                        node = parent;
                        shrunk = dir;
                    }
                    None => return,
                }
            }
        }
    }

    // Exchanges the positions of `a` and `b` in the tree, along with their balance factors.
    //
    // The two nodes may be adjacent, siblings, or unrelated.
    unsafe fn swap_nodes(&mut self, a: NonNull<T>, b: NonNull<T>) {
        if a == b {
            return;
        }

        let swap = |link: Link<T>| match link {
            Some(x) if x == a => Some(b),
            Some(x) if x == b => Some(a),
            other => other,
        };

        unsafe {
            let a_parent = self.links(a).parent();
            let a_children = self.links(a).children();
            let a_balance = self.links(a).balance();

            let b_parent = self.links(b).parent();
            let b_children = self.links(b).children();
            let b_balance = self.links(b).balance();

            // Re-point the parents' child links, visiting a shared parent only once.
            let parents = if a_parent == b_parent {
                [a_parent, None]
            } else {
                [a_parent, b_parent]
            };

            for parent in parents.into_iter().flatten() {
                if parent == a || parent == b {
                    continue;
                }

                let children = self.links(parent).children();
                self.links_mut(parent).set_children(children.map(swap));
            }

            let a_links = self.links_mut(a);
            a_links.set_parent(swap(b_parent));
            a_links.set_children(b_children.map(swap));
            a_links.set_balance(b_balance);

            let b_links = self.links_mut(b);
            b_links.set_parent(swap(a_parent));
            b_links.set_children(a_children.map(swap));
            b_links.set_balance(a_balance);

            // Re-point the children's parent links.
            for (node, children) in [(a, b_children), (b, a_children)] {
                for child in children.into_iter().flatten() {
                    if child != a && child != b {
                        self.links_mut(child).set_parent(Some(node));
                    }
                }
            }

            self.root = swap(self.root);
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root.take();

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend until a leaf is reached.
                let links = self.links(cur);
                if let Some(child) = links.left().or(links.right()) {
                    opt_cur = Some(child);
                    continue;
                }

                // Unlink and drop the leaf, then climb to its parent.
                let parent = links.parent();
                if let Some(parent) = parent {
                    self.replace_child(parent, cur, None);
                }

                drop(T::from_ptr(cur));
                self.len -= 1;

                opt_cur = parent;
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    #[inline]
    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { self.links(parent).left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn children(&self) -> [Link<T>; 2] {
        unsafe { (*self.inner.get()).children }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_children(&mut self, children: [Link<T>; 2]) {
        self.inner.get_mut().children = children;
    }

    #[inline]
    fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    // Adds `diff` to the balance factor and returns the result.
    #[inline]
    fn update_balance(&mut self, diff: i8) -> i8 {
        let inner = self.inner.get_mut();
        inner.balance = inner
            .balance
            .checked_add(diff)
            .expect("balance factor overflow");
        inner.balance
    }

    // Detaches the links from any tree.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("children", &self.children())
            .field("balance", &self.balance())
            .finish()
    }
}
