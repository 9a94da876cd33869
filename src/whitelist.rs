// 9.1 whitelist.rs: which collaterals, products, otokens and callees the controller accepts.

use std::collections::HashSet;

use crate::otoken::ProductKey;
use crate::types::Address;

pub trait Whitelist {
    fn is_whitelisted_collateral(&self, asset: Address) -> bool;

    fn is_whitelisted_product(&self, product: &ProductKey) -> bool;

    fn is_whitelisted_otoken(&self, otoken: Address) -> bool;

    fn is_whitelisted_callee(&self, callee: Address) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryWhitelist {
    collaterals: HashSet<Address>,
    products: HashSet<ProductKey>,
    otokens: HashSet<Address>,
    callees: HashSet<Address>,
}

impl InMemoryWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn whitelist_collateral(&mut self, asset: Address) {
        self.collaterals.insert(asset);
    }

    pub fn blacklist_collateral(&mut self, asset: Address) {
        self.collaterals.remove(&asset);
    }

    pub fn whitelist_product(&mut self, product: ProductKey) {
        self.products.insert(product);
    }

    pub fn blacklist_product(&mut self, product: &ProductKey) {
        self.products.remove(product);
    }

    pub fn whitelist_otoken(&mut self, otoken: Address) {
        self.otokens.insert(otoken);
    }

    pub fn blacklist_otoken(&mut self, otoken: Address) {
        self.otokens.remove(&otoken);
    }

    pub fn whitelist_callee(&mut self, callee: Address) {
        self.callees.insert(callee);
    }

    pub fn blacklist_callee(&mut self, callee: Address) {
        self.callees.remove(&callee);
    }
}

impl Whitelist for InMemoryWhitelist {
    fn is_whitelisted_collateral(&self, asset: Address) -> bool {
        self.collaterals.contains(&asset)
    }

    fn is_whitelisted_product(&self, product: &ProductKey) -> bool {
        self.products.contains(product)
    }

    fn is_whitelisted_otoken(&self, otoken: Address) -> bool {
        self.otokens.contains(&otoken)
    }

    fn is_whitelisted_callee(&self, callee: Address) -> bool {
        self.callees.contains(&callee)
    }
}
