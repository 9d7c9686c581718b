//! Caller-driven placement: dropping an item onto a specific grid anchor.
//! This module exists to apply the container capability table before touching any grid.
//! It does not own the geometry test or first-fit placement.

use super::*;

impl Game {
    /// Drops `id` onto `target` with its shape anchored at `anchor`.
    ///
    /// A shop offer dropped this way is a purchase and yields a new item. A
    /// grid item is moved; if the target rejects it, it stays exactly where
    /// it was. Returns the cells the item now occupies.
    pub fn place(
        &mut self,
        id: ItemId,
        target: Owner,
        anchor: usize,
    ) -> Result<Vec<usize>, GameError> {
        self.ensure_idle()?;
        let key = self.state.find(id).ok_or(GameError::UnknownItem(id))?;
        let source = self.state.items[key].owner;
        if !source.capabilities().draggable {
            return Err(GameError::Forbidden { owner: source, action: "moving" });
        }
        if !target.capabilities().accepts_drops {
            return Err(GameError::Forbidden { owner: target, action: "dropping" });
        }

        if source == Owner::Shop {
            return self.place_offer(key, target, anchor);
        }
        self.move_item(key, source, target, anchor)
    }

    fn place_offer(
        &mut self,
        offer_key: ItemKey,
        target: Owner,
        anchor: usize,
    ) -> Result<Vec<usize>, GameError> {
        let offer = &self.state.items[offer_key];
        let (template_key, price) = (offer.template_key.clone(), offer.price);
        let grid = self
            .state
            .grid(target)
            .ok_or(GameError::Forbidden { owner: target, action: "dropping" })?;
        grid.fit(anchor, &offer.shape)?;
        self.check_funds(price)?;
        let (_, cells) = self.purchase_into(offer_key, &template_key, price, target, anchor)?;
        Ok(cells)
    }

    fn move_item(
        &mut self,
        key: ItemKey,
        source: Owner,
        target: Owner,
        anchor: usize,
    ) -> Result<Vec<usize>, GameError> {
        let Some(source_grid) = self.state.grid_mut(source) else {
            return Err(GameError::Forbidden { owner: source, action: "moving" });
        };
        let original = source_grid.cells_of(key);
        source_grid.evict(key);

        let committed = match self.state.grid_and_items_mut(target) {
            Some((grid, items)) => grid.commit(items, key, anchor),
            None => Err(GameError::Forbidden { owner: target, action: "dropping" }),
        };
        match committed {
            Ok(cells) => {
                let id = self.state.items[key].id;
                self.log.push(LogEvent::Moved { item: id, to: target });
                Ok(cells)
            }
            Err(err) => {
                if let Some(source_grid) = self.state.grid_mut(source) {
                    source_grid.occupy(key, &original);
                }
                Err(err)
            }
        }
    }
}
