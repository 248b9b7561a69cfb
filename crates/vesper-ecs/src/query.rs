#![allow(private_interfaces)]

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::component::{ComponentStore, SparseSet};
use crate::entity::{Entity, EntityAllocator};

/// Trait implemented by query parameter types: `&T`, `&mut T`, `Option<&T>`,
/// and tuples of those. A query matches the conjunction of every required
/// component type in the tuple.
///
/// # Safety
/// Implementors must report exactly the component types whose presence
/// [`fetch`](QueryParam::fetch) relies on.
pub unsafe trait QueryParam {
    type Item<'w>;

    /// Component types an entity must carry to match this parameter.
    fn required_type_ids() -> Vec<TypeId>;

    /// Fetch the item for one entity slot.
    ///
    /// # Safety
    /// The caller must visit each entity at most once per iteration so that
    /// `&mut` items never alias.
    unsafe fn fetch<'w>(
        stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
        index: u32,
    ) -> Option<Self::Item<'w>>;
}

unsafe impl<T: 'static + Send + Sync> QueryParam for &T {
    type Item<'w> = &'w T;

    fn required_type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    unsafe fn fetch<'w>(
        stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
        index: u32,
    ) -> Option<Self::Item<'w>> {
        let store = stores.get(&TypeId::of::<T>())?;
        store.as_any().downcast_ref::<SparseSet<T>>()?.get(index)
    }
}

unsafe impl<T: 'static + Send + Sync> QueryParam for &mut T {
    type Item<'w> = &'w mut T;

    fn required_type_ids() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    unsafe fn fetch<'w>(
        stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
        index: u32,
    ) -> Option<Self::Item<'w>> {
        let store = stores.get(&TypeId::of::<T>())?;
        // The iterator visits each entity once, so handing out one `&mut`
        // per entity cannot alias.
        let ptr = store.as_ref() as *const dyn ComponentStore as *mut dyn ComponentStore;
        (*ptr).as_any_mut().downcast_mut::<SparseSet<T>>()?.get_mut(index)
    }
}

unsafe impl<T: 'static + Send + Sync> QueryParam for Option<&T> {
    type Item<'w> = Option<&'w T>;

    fn required_type_ids() -> Vec<TypeId> {
        vec![]
    }

    unsafe fn fetch<'w>(
        stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
        index: u32,
    ) -> Option<Self::Item<'w>> {
        Some(
            stores
                .get(&TypeId::of::<T>())
                .and_then(|s| s.as_any().downcast_ref::<SparseSet<T>>())
                .and_then(|set| set.get(index)),
        )
    }
}

macro_rules! impl_query_param_tuple {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        unsafe impl<$($name: QueryParam),+> QueryParam for ($($name,)+) {
            type Item<'w> = ($($name::Item<'w>,)+);

            fn required_type_ids() -> Vec<TypeId> {
                let mut ids = Vec::new();
                $(ids.extend($name::required_type_ids());)+
                ids
            }

            unsafe fn fetch<'w>(
                stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
                index: u32,
            ) -> Option<Self::Item<'w>> {
                Some(($($name::fetch(stores, index)?,)+))
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

/// Iterator returned by [`World::query`](crate::World::query). Yields
/// `(Entity, Q::Item)` for every matching entity.
///
/// The candidate list is snapshotted from the smallest required component's
/// dense index when the query is created, so results follow that index's
/// insertion order. The `&World` borrow held by the iterator rules out
/// structural changes while it is live.
pub struct QueryIter<'w, Q: QueryParam> {
    entities: &'w EntityAllocator,
    stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
    candidates: Vec<u32>,
    cursor: usize,
    _marker: PhantomData<Q>,
}

impl<'w, Q: QueryParam> QueryIter<'w, Q> {
    pub(crate) fn new(
        entities: &'w EntityAllocator,
        stores: &'w HashMap<TypeId, Box<dyn ComponentStore>>,
        candidates: Vec<u32>,
    ) -> Self {
        Self {
            entities,
            stores,
            candidates,
            cursor: 0,
            _marker: PhantomData,
        }
    }
}

impl<'w, Q: QueryParam> Iterator for QueryIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let index = *self.candidates.get(self.cursor)?;
            self.cursor += 1;

            let Some(entity) = self.entities.entity_at(index) else {
                continue;
            };
            // Safety: each candidate index is visited at most once.
            if let Some(item) = unsafe { Q::fetch(self.stores, index) } {
                return Some((entity, item));
            }
        }
    }
}
