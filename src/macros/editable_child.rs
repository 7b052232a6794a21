/// Implements [`TrackStatus`](crate::entity::TrackStatus) and
/// [`EditableChild`](crate::entity::EditableChild) for a struct embedding a
/// [`ChildState`](crate::entity::ChildState).
///
/// ```ignore
/// impl_editable_child!(Note, state);
/// impl_editable_child!(Project, state, children: [tasks]);
/// ```
///
/// Fields listed under `children` are nested
/// [`EditableCollection`](crate::collection::EditableCollection)s. Their
/// dirty, valid and busy flags roll up into the entity's, their broken rules
/// are reported with the entity's own, and they are re-linked under the
/// entity whenever the entity gets a new parent.
#[macro_export]
macro_rules! impl_editable_child {
    ($ty:ty, $state:ident) => {
        $crate::impl_editable_child!($ty, $state, children: []);
    };
    ($ty:ty, $state:ident, children: [$($child:ident),* $(,)?]) => {
        impl $crate::entity::TrackStatus for $ty {
            fn is_new(&self) -> bool {
                self.$state.is_new()
            }

            fn is_deleted(&self) -> bool {
                self.$state.is_deleted()
            }

            fn is_self_dirty(&self) -> bool {
                self.$state.is_dirty()
            }

            fn is_dirty(&self) -> bool {
                self.$state.is_dirty()
                    $(|| $crate::entity::TrackStatus::is_dirty(&self.$child))*
            }

            fn is_self_valid(&self) -> bool {
                self.$state.is_valid()
            }

            fn is_valid(&self) -> bool {
                self.$state.is_valid()
                    $(&& $crate::entity::TrackStatus::is_valid(&self.$child))*
            }

            fn is_self_busy(&self) -> bool {
                self.$state.is_busy()
            }

            fn is_busy(&self) -> bool {
                self.$state.is_busy()
                    $(|| $crate::entity::TrackStatus::is_busy(&self.$child))*
            }

            fn is_child(&self) -> bool {
                self.$state.is_child()
            }
        }

        impl $crate::entity::EditableChild for $ty {
            fn identity(&self) -> $crate::core::Identity {
                self.$state.identity()
            }

            fn parent(&self) -> $crate::graph::ParentLink {
                self.$state.parent()
            }

            fn set_parent(&mut self, parent: $crate::graph::ParentLink) {
                self.$state.set_parent(parent);
                $(
                    self.$child.mark_as_child();
                    self.$child.set_parent(self.$state.link());
                )*
            }

            fn mark_as_child(&mut self) {
                self.$state.mark_as_child();
            }

            fn mark_deleted(&mut self) {
                self.$state.mark_deleted();
            }

            fn mark_undeleted(&mut self) {
                self.$state.mark_undeleted();
            }

            fn mark_new(&mut self) {
                self.$state.mark_new();
            }

            fn mark_old(&mut self) {
                self.$state.mark_old();
            }

            fn broken_rules(&self) -> Vec<String> {
                #[allow(unused_mut)]
                let mut rules = self.$state.broken_rules().to_vec();
                $(rules.extend(self.$child.broken_rules());)*
                rules
            }
        }
    };
}
