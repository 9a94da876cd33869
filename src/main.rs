//! Options Vault Core Simulation.
//!
//! Walks the controller through writing, hedging, rejecting and settling
//! collateralized option vaults. Set `RUST_LOG=debug` to see batch logs.

use options_vault_core::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

type Sim = Controller<InMemoryOracle, InMemoryWhitelist, TokenBank>;

const EXPIRY: u64 = 1_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Options Vault Core Simulation");
    println!("Single Expiry, One Asset Per Slot, Atomic Batches\n");

    scenario_1_put_vault_lifecycle();
    scenario_2_call_spread();
    scenario_3_rejected_over_mint();
    scenario_4_operator_and_pause();

    println!("\nAll simulations completed successfully.");
}

fn weth() -> Address {
    Address::from_low_u64(1)
}

fn usdc() -> Address {
    Address::from_low_u64(2)
}

fn pool() -> Address {
    Address::from_low_u64(0x9001)
}

fn admin() -> Address {
    Address::from_low_u64(0xad)
}

fn put_250() -> Address {
    Address::from_low_u64(100)
}

fn call_200() -> Address {
    Address::from_low_u64(200)
}

fn call_250() -> Address {
    Address::from_low_u64(201)
}

fn terms(strike: u64, is_put: bool) -> OtokenDescriptor {
    OtokenDescriptor {
        underlying: weth(),
        strike_asset: usdc(),
        collateral_asset: if is_put { usdc() } else { weth() },
        strike_price: Price::from_units(strike),
        expiry: Timestamp::from_secs(EXPIRY),
        is_put,
    }
}

/// Fresh controller with ETH puts (USDC collateral) and ETH calls (WETH collateral) listed.
fn setup() -> Sim {
    let config = Environment::Development.config();
    config.validate().unwrap();

    let mut oracle = InMemoryOracle::new(config.oracle.clone());
    oracle.set_spot_price(weth(), Price::from_units(300));
    oracle.set_spot_price(usdc(), Price::from_units(1));

    let mut bank = TokenBank::new(pool());
    let mut whitelist = InMemoryWhitelist::new();
    whitelist.whitelist_collateral(usdc());
    whitelist.whitelist_collateral(weth());

    for (otoken, descriptor) in [(put_250(), terms(250, true)), (call_200(), terms(200, false)), (call_250(), terms(250, false))] {
        bank.register_otoken(otoken, descriptor);
        whitelist.whitelist_product(descriptor.product());
        whitelist.whitelist_otoken(otoken);
    }

    Controller::new(config.controller, admin(), oracle, whitelist, bank)
}

fn expire(sim: &mut Sim, weth_price: u64) {
    let expiry = Timestamp::from_secs(EXPIRY);
    sim.set_time(expiry);
    sim.oracle_mut().set_expiry_price(weth(), expiry, Price::from_units(weth_price)).unwrap();
    sim.oracle_mut().set_expiry_price(usdc(), expiry, Price::from_units(1)).unwrap();
}

/// Write puts against USDC, let them expire in the money, redeem and settle.
fn scenario_1_put_vault_lifecycle() {
    println!("Scenario 1: Put Vault Lifecycle\n");

    let mut sim = setup();
    let alice = Address::from_low_u64(0xa11ce);
    let bob = Address::from_low_u64(0xb0b);
    sim.bank_mut().credit(usdc(), alice, Amount::from_units(3_000)).unwrap();

    let receipt = sim
        .operate(
            alice,
            &[
                ActionArgs::open_vault(alice, 1),
                ActionArgs::deposit_collateral(alice, 1, alice, usdc(), Amount::from_units(3_000)),
                ActionArgs::mint_short(alice, 1, bob, put_250(), Amount::from_units(12)),
            ],
        )
        .unwrap();

    println!("  Alice deposits 3000 USDC and writes 12 ETH-250 puts to Bob");
    println!("  Batch {}: {} actions, {} transfers", receipt.batch_id, receipt.actions_applied, receipt.transfers_executed);
    println!("  Free collateral: {} USDC\n", sim.proceeds(alice, 1).unwrap());

    expire(&mut sim, 200);
    println!("  Expiry: ETH settles at 200");
    println!("  Cash value per put: {}", sim.calculator().expired_cash_value(put_250()).unwrap());

    sim.operate(bob, &[ActionArgs::redeem(put_250(), bob, Amount::from_units(12))]).unwrap();
    sim.operate(alice, &[ActionArgs::settle_vault(alice, 1, alice)]).unwrap();

    println!("  Bob redeems 12 puts: {} USDC", sim.bank().balance_of(usdc(), bob));
    println!("  Alice settles the vault: {} USDC", sim.bank().balance_of(usdc(), alice));
    println!("  Pool left with: {} USDC\n", sim.bank().pool_balance(usdc()));
}

/// Hedge a short 200 call with a long 250 call and post only the spread.
fn scenario_2_call_spread() {
    println!("Scenario 2: Call Credit Spread\n");

    let mut sim = setup();
    let carol = Address::from_low_u64(0xca401);
    let erin = Address::from_low_u64(0xe41);
    sim.bank_mut().credit(weth(), erin, Amount::from_units(1)).unwrap();
    sim.bank_mut().credit(weth(), carol, Amount::from_decimal(dec!(0.2)).unwrap()).unwrap();

    // erin writes the 250 call that carol uses as cover
    sim.operate(
        erin,
        &[
            ActionArgs::open_vault(erin, 1),
            ActionArgs::deposit_collateral(erin, 1, erin, weth(), Amount::from_units(1)),
            ActionArgs::mint_short(erin, 1, carol, call_250(), Amount::from_units(1)),
        ],
    )
    .unwrap();

    sim.operate(
        carol,
        &[
            ActionArgs::open_vault(carol, 1),
            ActionArgs::deposit_long(carol, 1, carol, call_250(), Amount::from_units(1)),
            ActionArgs::deposit_collateral(carol, 1, carol, weth(), Amount::from_decimal(dec!(0.2)).unwrap()),
            ActionArgs::mint_short(carol, 1, carol, call_200(), Amount::from_units(1)),
        ],
    )
    .unwrap();

    println!("  Carol: long 1 ETH-250 call, short 1 ETH-200 call, 0.2 WETH posted");
    println!("  Carol free collateral: {} WETH\n", sim.proceeds(carol, 1).unwrap());

    expire(&mut sim, 300);
    println!("  Expiry: ETH settles at 300");
    println!("  Payout per 200 call: {} WETH", sim.calculator().expired_payout_rate(call_200()).unwrap());

    sim.operate(carol, &[ActionArgs::redeem(call_200(), carol, Amount::from_units(1))]).unwrap();
    sim.operate(carol, &[ActionArgs::settle_vault(carol, 1, carol)]).unwrap();
    sim.operate(erin, &[ActionArgs::settle_vault(erin, 1, erin)]).unwrap();

    println!("  Carol after redeem + settle: {} WETH", sim.bank().balance_of(weth(), carol));
    println!("  Erin after settle: {} WETH", sim.bank().balance_of(weth(), erin));
    println!("  Rounding dust in pool: {} WETH\n", sim.bank().pool_balance(weth()));
}

/// Minting past the collateral's reach undoes the whole batch.
fn scenario_3_rejected_over_mint() {
    println!("Scenario 3: Rejected Over-Mint\n");

    let mut sim = setup();
    let dave = Address::from_low_u64(0xda5e);
    sim.bank_mut().credit(usdc(), dave, Amount::from_units(3_000)).unwrap();

    let err = sim
        .operate(
            dave,
            &[
                ActionArgs::open_vault(dave, 1),
                ActionArgs::deposit_collateral(dave, 1, dave, usdc(), Amount::from_units(3_000)),
                ActionArgs::mint_short(dave, 1, dave, put_250(), Amount::from_units(13)),
            ],
        )
        .unwrap_err();

    println!("  Dave deposits 3000 USDC and tries to write 13 ETH-250 puts");
    println!("  Rejected ({:?}): {}", err.category(), err);
    println!("  Vault counter still: {}", sim.account_vault_counter(dave));
    println!("  Dave still holds: {} USDC", sim.bank().balance_of(usdc(), dave));
    println!("  Events emitted: {}\n", sim.events().len());
}

/// Operators act for owners; a partial pause still lets holders exit.
fn scenario_4_operator_and_pause() {
    println!("Scenario 4: Operators and Pauses\n");

    let mut sim = setup();
    let frank = Address::from_low_u64(0xf4a);
    let bot = Address::from_low_u64(0xb07);
    sim.bank_mut().credit(usdc(), frank, Amount::from_units(500)).unwrap();

    sim.set_operator(frank, bot, true).unwrap();
    sim.operate(
        bot,
        &[
            ActionArgs::open_vault(frank, 1),
            ActionArgs::deposit_collateral(frank, 1, frank, usdc(), Amount::from_units(500)),
            ActionArgs::mint_short(frank, 1, frank, put_250(), Amount::from_units(2)),
        ],
    )
    .unwrap();
    println!("  Bot writes 2 puts into Frank's vault as operator");

    sim.set_system_partially_paused(admin(), true).unwrap();
    let blocked = sim
        .operate(frank, &[ActionArgs::burn_short(frank, 1, frank, put_250(), Amount::from_units(1))])
        .unwrap_err();
    println!("  Partial pause: {}", blocked);

    expire(&mut sim, 260);
    sim.operate(frank, &[ActionArgs::settle_vault(frank, 1, frank)]).unwrap();
    println!("  Settle still allowed: Frank gets back {} USDC", sim.bank().balance_of(usdc(), frank));

    for event in sim.recent_events(3) {
        println!("  event #{} at {}: {:?}", event.id.0, event.timestamp, event.payload);
    }
}
