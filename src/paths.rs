use core::ptr::NonNull;

use crate::{AvlTree, Link, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns `true` if every node with two children has subtrees of equal depth.
    ///
    /// A node with a single child is not compared against its missing side; the check continues
    /// into the child. Leaves and the empty tree pass trivially.
    pub fn equal_paths(&self) -> bool {
        self.root
            .map_or(true, |root| unsafe { self.equal_paths_at(root) })
    }

    unsafe fn equal_paths_at(&self, node: NonNull<T>) -> bool {
        unsafe {
            let links = self.links(node);

            match (links.left(), links.right()) {
                (None, None) => true,
                (Some(child), None) | (None, Some(child)) => self.equal_paths_at(child),
                (Some(left), Some(right)) => {
                    self.depth(Some(left)) == self.depth(Some(right))
                        && self.equal_paths_at(left)
                        && self.equal_paths_at(right)
                }
            }
        }
    }

    // Unlike `height`, this visits the whole subtree and does not trust balance factors.
    unsafe fn depth(&self, opt_node: Link<T>) -> usize {
        let Some(node) = opt_node else {
            return 0;
        };

        unsafe {
            let links = self.links(node);
            1 + self.depth(links.left()).max(self.depth(links.right()))
        }
    }
}
