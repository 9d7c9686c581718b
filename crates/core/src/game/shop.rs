//! Shop stock, purchases, and sales.
//! This module exists to keep gold accounting next to the item churn it pays for.
//! It does not own drag-and-drop placement of offers onto a chosen anchor.

use super::*;
use crate::error::PlacementRejection;

/// Gold refunded for an item bought at `price`. Never less than 1.
pub fn sale_value(price: u32, sell_ratio: f64) -> u32 {
    (f64::from(price) * sell_ratio).round().max(1.0) as u32
}

impl Game {
    /// Replaces every offer with `shop_size` offers drawn from distinct templates.
    pub fn fill_shop(&mut self) {
        for key in mem::take(&mut self.state.shop) {
            self.state.items.remove(key);
        }
        let mut pool: Vec<usize> = (0..self.content.templates().len()).collect();
        while self.state.shop.len() < self.config.shop_size && !pool.is_empty() {
            let pick = self.pick(pool.len());
            let id = match self.ids.allocate() {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(%err, "shop left short");
                    break;
                }
            };
            let template = &self.content.templates()[pool.swap_remove(pick)];
            let item = self.content.instantiate_template(template, Owner::Shop, id);
            let key = self.state.items.insert(item);
            self.state.shop.push(key);
        }
        let offers = self.state.shop.len();
        self.log.push(LogEvent::ShopRefilled { offers });
        tracing::info!(offers, "shop refilled");
    }

    /// Buys an offer into the first free spot of the roster, then the stash.
    /// Nothing changes unless gold and space both allow it.
    pub fn buy(&mut self, offer: ItemId) -> Result<ItemId, GameError> {
        self.ensure_idle()?;
        let offer_key = self.offer_key(offer)?;
        let (template_key, price) = {
            let item = &self.state.items[offer_key];
            (item.template_key.clone(), item.price)
        };
        self.check_funds(price)?;

        let shape = &self.state.items[offer_key].shape;
        let (owner, anchor) = [Owner::Player, Owner::PlayerStash]
            .into_iter()
            .find_map(|owner| {
                let anchor = self.state.grid(owner)?.find_fit(shape)?;
                Some((owner, anchor))
            })
            .ok_or(PlacementRejection::NoFreePosition)?;

        let (id, _) = self.purchase_into(offer_key, &template_key, price, owner, anchor)?;
        Ok(id)
    }

    /// Sells a player-side item for `sale_value` of its price.
    pub fn sell(&mut self, id: ItemId) -> Result<u32, GameError> {
        self.ensure_idle()?;
        let key = self.state.find(id).ok_or(GameError::UnknownItem(id))?;
        let item = &self.state.items[key];
        if !item.owner.capabilities().sellable {
            return Err(GameError::Forbidden { owner: item.owner, action: "selling" });
        }
        let value = sale_value(item.price, self.config.sell_ratio);
        self.state.remove_item(key);
        self.state.gold = self.state.gold.saturating_add(value);
        self.log.push(LogEvent::Sold { item: id, value });
        tracing::debug!(item = %id, value, "item sold");
        Ok(value)
    }

    pub(super) fn offer_key(&self, offer: ItemId) -> Result<ItemKey, GameError> {
        self.state
            .find(offer)
            .filter(|key| self.state.shop.contains(key))
            .ok_or(GameError::UnknownItem(offer))
    }

    pub(super) fn check_funds(&self, price: u32) -> Result<(), GameError> {
        if self.state.gold < price {
            return Err(GameError::InsufficientGold { needed: price, available: self.state.gold });
        }
        Ok(())
    }

    /// Creates the bought instance at `anchor`, then consumes the offer and
    /// charges `price`. Callers check funds and fit first.
    pub(super) fn purchase_into(
        &mut self,
        offer_key: ItemKey,
        template_key: &str,
        price: u32,
        owner: Owner,
        anchor: usize,
    ) -> Result<(ItemId, Vec<usize>), GameError> {
        let item = self.content.create_instance(template_key, Owner::Shop, &mut self.ids)?;
        let id = item.id;
        let key = self.state.items.insert(item);
        let committed = match self.state.grid_and_items_mut(owner) {
            Some((grid, items)) => grid.commit(items, key, anchor),
            None => Err(GameError::Forbidden { owner, action: "dropping" }),
        };
        let cells = match committed {
            Ok(cells) => cells,
            Err(err) => {
                self.state.items.remove(key);
                return Err(err);
            }
        };
        self.state.remove_item(offer_key);
        self.state.gold -= price;
        self.log.push(LogEvent::Purchased { item: id, price });
        tracing::debug!(item = %id, price, grid = %owner, "item purchased");
        Ok((id, cells))
    }
}
