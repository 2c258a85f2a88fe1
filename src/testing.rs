//! Test harness: an in-memory constant-product chain and a manual clock
//!
//! `MockChain` decodes the signed raw transactions the executor produces and
//! applies them to a ledger the way a Uniswap V2 router, a WETH contract and
//! ERC20 tokens would. Nonces, allowances, balances and slippage minimums are
//! enforced; a failed call leaves the ledger untouched and yields a receipt
//! with `success = false`.

use crate::amm::{sort_tokens, Fraction, Tolerance};
use crate::chain::{CallRequest, ChainClient, ChainError, ReceiptSummary};
use crate::contracts::{IUniswapV2Router02, IERC20, IWETH};
use crate::execution::{Account, ActionKind, ExecutorSettings, GasPolicy, StepExecutor};
use crate::operations::{ComposerSettings, OperationComposer, OperationKind};
use crate::scheduler::{AmountSpec, Clock, RoundSettings};
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, keccak256, Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Well-known anvil key #0
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
pub const CHAIN_ID: u64 = 6342;
pub const WETH: Address = address!("776401b9bc8aae31a685731b7147d4445fd9fb19");
pub const ROUTER: Address = address!("a6b579684e943f7d00d616a48cf99b5147fc57a5");
pub const FACTORY: Address = address!("1adb8f973373505bb206e0e5d87af8fb1f5514ef");
/// Sorts after WETH: pools list WETH as token0
pub const TOKEN_A: Address = address!("9629684df53db9e4484697d0a50c442b2bfa80a8");
/// Sorts before WETH: pools list WETH as token1
pub const TOKEN_B: Address = address!("1d2e159712c1a109fa869cc9fef0e3e60abd542b");

const ONE_ETH: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone)]
struct Pool {
    address: Address,
    reserve0: U256,
    reserve1: U256,
    supply: U256,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    native: HashMap<Address, U256>,
    /// (token, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// keyed by canonical (token0, token1)
    pools: HashMap<(Address, Address), Pool>,
}

fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    let in_with_fee = amount_in * U256::from(997u64);
    let denominator = reserve_in * U256::from(1000u64) + in_with_fee;
    if denominator.is_zero() {
        return U256::ZERO;
    }
    in_with_fee * reserve_out / denominator
}

impl Ledger {
    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances.get(&(token, holder)).copied().unwrap_or_default()
    }

    fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        *self.balances.entry((token, holder)).or_default() += amount;
    }

    /// `transferFrom(owner -> router)` as the router does it
    fn pull(&mut self, token: Address, owner: Address, amount: U256) -> Result<(), String> {
        let allowance = self
            .allowances
            .get(&(token, owner, ROUTER))
            .copied()
            .unwrap_or_default();
        let balance = self.balance(token, owner);
        if allowance < amount || balance < amount {
            return Err("TransferHelper: TRANSFER_FROM_FAILED".to_string());
        }
        if allowance != U256::MAX {
            self.allowances.insert((token, owner, ROUTER), allowance - amount);
        }
        self.balances.insert((token, owner), balance - amount);
        Ok(())
    }

    /// Pool plus reserves oriented as (a, b)
    fn oriented(&self, a: Address, b: Address) -> Option<(Pool, U256, U256)> {
        let (t0, _) = sort_tokens(a, b);
        let pool = self.pools.get(&sort_tokens(a, b))?.clone();
        if t0 == a {
            let (r0, r1) = (pool.reserve0, pool.reserve1);
            Some((pool, r0, r1))
        } else {
            let (r0, r1) = (pool.reserve1, pool.reserve0);
            Some((pool, r0, r1))
        }
    }

    fn set_reserves(&mut self, a: Address, b: Address, ra: U256, rb: U256, supply: U256) {
        let key = sort_tokens(a, b);
        if let Some(pool) = self.pools.get_mut(&key) {
            if key.0 == a {
                pool.reserve0 = ra;
                pool.reserve1 = rb;
            } else {
                pool.reserve0 = rb;
                pool.reserve1 = ra;
            }
            pool.supply = supply;
        }
    }

    fn swap(&mut self, call: IUniswapV2Router02::swapExactTokensForTokensCall) -> Result<U256, String> {
        if call.path.len() != 2 {
            return Err("UniswapV2Library: INVALID_PATH".to_string());
        }
        let (token_in, token_out) = (call.path[0], call.path[1]);
        let (pool, r_in, r_out) = self
            .oriented(token_in, token_out)
            .ok_or_else(|| "UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string())?;

        let amount_out = get_amount_out(call.amountIn, r_in, r_out);
        if amount_out < call.amountOutMin {
            return Err("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT".to_string());
        }
        self.pull(token_in, OWNER, call.amountIn)?;
        self.credit(token_out, call.to, amount_out);
        self.set_reserves(token_in, token_out, r_in + call.amountIn, r_out - amount_out, pool.supply);
        Ok(amount_out)
    }

    fn add_liquidity(&mut self, call: IUniswapV2Router02::addLiquidityCall) -> Result<(), String> {
        let (pool, ra, rb) = self
            .oriented(call.tokenA, call.tokenB)
            .ok_or_else(|| "UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string())?;

        let b_optimal = call.amountADesired * rb / ra;
        let (amount_a, amount_b) = if b_optimal <= call.amountBDesired {
            if b_optimal < call.amountBMin {
                return Err("UniswapV2Router: INSUFFICIENT_B_AMOUNT".to_string());
            }
            (call.amountADesired, b_optimal)
        } else {
            let a_optimal = call.amountBDesired * ra / rb;
            if a_optimal < call.amountAMin {
                return Err("UniswapV2Router: INSUFFICIENT_A_AMOUNT".to_string());
            }
            (a_optimal, call.amountBDesired)
        };

        self.pull(call.tokenA, OWNER, amount_a)?;
        self.pull(call.tokenB, OWNER, amount_b)?;

        let liquidity = (amount_a * pool.supply / ra).min(amount_b * pool.supply / rb);
        if liquidity.is_zero() {
            return Err("UniswapV2: INSUFFICIENT_LIQUIDITY_MINTED".to_string());
        }
        self.credit(pool.address, call.to, liquidity);
        self.set_reserves(call.tokenA, call.tokenB, ra + amount_a, rb + amount_b, pool.supply + liquidity);
        Ok(())
    }

    fn remove_liquidity(&mut self, call: IUniswapV2Router02::removeLiquidityCall) -> Result<(), String> {
        let (pool, ra, rb) = self
            .oriented(call.tokenA, call.tokenB)
            .ok_or_else(|| "UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string())?;

        self.pull(pool.address, OWNER, call.liquidity)?;
        let amount_a = call.liquidity * ra / pool.supply;
        let amount_b = call.liquidity * rb / pool.supply;
        if amount_a < call.amountAMin {
            return Err("UniswapV2Router: INSUFFICIENT_A_AMOUNT".to_string());
        }
        if amount_b < call.amountBMin {
            return Err("UniswapV2Router: INSUFFICIENT_B_AMOUNT".to_string());
        }
        self.credit(call.tokenA, call.to, amount_a);
        self.credit(call.tokenB, call.to, amount_b);
        self.set_reserves(
            call.tokenA,
            call.tokenB,
            ra - amount_a,
            rb - amount_b,
            pool.supply - call.liquidity,
        );
        Ok(())
    }
}

/// A transaction the mock accepted
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub kind: ActionKind,
    pub nonce: u64,
    pub to: Address,
    pub input: Bytes,
}

#[derive(Default)]
struct MockState {
    ledger: Ledger,
    nonces: HashMap<Address, u64>,
    symbols: HashMap<Address, String>,
    receipts: HashMap<TxHash, ReceiptSummary>,
    submitted: Vec<SubmittedTx>,
    send_attempts: usize,
    block: u64,
    quote_calls: usize,
    last_revert: Option<String>,
    last_swap_output: Option<U256>,
    // failure injection
    fail_reads: bool,
    fail_quotes: bool,
    fail_submission_at: Option<usize>,
    drop_receipts: bool,
    quote_override: Option<U256>,
    forced_reverts: HashMap<ActionKind, String>,
}

fn classify_selector(input: &[u8]) -> Option<ActionKind> {
    let selector: [u8; 4] = input.get(..4)?.try_into().ok()?;
    if selector == IWETH::depositCall::SELECTOR {
        Some(ActionKind::Deposit)
    } else if selector == IERC20::approveCall::SELECTOR {
        Some(ActionKind::Approve)
    } else if selector == IUniswapV2Router02::swapExactTokensForTokensCall::SELECTOR {
        Some(ActionKind::Swap)
    } else if selector == IUniswapV2Router02::addLiquidityCall::SELECTOR {
        Some(ActionKind::AddLiquidity)
    } else if selector == IUniswapV2Router02::removeLiquidityCall::SELECTOR {
        Some(ActionKind::RemoveLiquidity)
    } else {
        None
    }
}

fn decode<T: SolCall>(input: &[u8]) -> Result<T, String> {
    T::abi_decode(input).map_err(|e| format!("bad calldata: {}", e))
}

impl MockState {
    /// Run a call against a copy of the ledger; commit only on success.
    fn apply(&mut self, kind: ActionKind, to: Address, value: U256, input: &[u8]) -> Result<(), String> {
        if let Some(reason) = self.forced_reverts.get(&kind) {
            return Err(reason.clone());
        }

        let mut ledger = self.ledger.clone();
        let mut swap_output = None;
        match kind {
            ActionKind::Deposit => {
                let native = ledger.native.get(&OWNER).copied().unwrap_or_default();
                ledger.native.insert(OWNER, native - value);
                ledger.credit(to, OWNER, value);
            }
            ActionKind::Approve => {
                let call: IERC20::approveCall = decode(input)?;
                ledger.allowances.insert((to, OWNER, call.spender), call.amount);
            }
            ActionKind::Swap => {
                if to != ROUTER {
                    return Err("not a router".to_string());
                }
                swap_output = Some(ledger.swap(decode(input)?)?);
            }
            ActionKind::AddLiquidity => {
                if to != ROUTER {
                    return Err("not a router".to_string());
                }
                ledger.add_liquidity(decode(input)?)?;
            }
            ActionKind::RemoveLiquidity => {
                if to != ROUTER {
                    return Err("not a router".to_string());
                }
                ledger.remove_liquidity(decode(input)?)?;
            }
        }

        self.ledger = ledger;
        if swap_output.is_some() {
            self.last_swap_output = swap_output;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner holds 1 ETH
    pub fn funded() -> Self {
        let chain = Self::new();
        chain.set_native_balance(OWNER, U256::from(ONE_ETH));
        chain
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    // ── setup ──────────────────────────────────────────────────────────

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state().ledger.native.insert(owner, amount);
    }

    pub fn set_nonce(&self, owner: Address, nonce: u64) {
        self.state().nonces.insert(owner, nonce);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state().ledger.balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state().ledger.allowances.insert((token, owner, spender), amount);
    }

    pub fn set_symbol(&self, token: Address, symbol: &str) {
        self.state().symbols.insert(token, symbol.to_string());
    }

    /// Create a WETH/`token` pool and return its address. The initial LP
    /// supply equals the WETH reserve and is held by nobody.
    pub fn add_pool(&self, token: Address, weth_reserve: U256, token_reserve: U256) -> Address {
        let (t0, t1) = sort_tokens(WETH, token);
        let hash = keccak256([t0.as_slice(), t1.as_slice()].concat());
        let address = Address::from_slice(&hash[12..]);
        let (reserve0, reserve1) = if t0 == WETH {
            (weth_reserve, token_reserve)
        } else {
            (token_reserve, weth_reserve)
        };
        self.state().ledger.pools.insert(
            (t0, t1),
            Pool {
                address,
                reserve0,
                reserve1,
                supply: weth_reserve,
            },
        );
        address
    }

    // ── failure injection ──────────────────────────────────────────────

    pub fn fail_reads(&self, on: bool) {
        self.state().fail_reads = on;
    }

    pub fn fail_quotes(&self, on: bool) {
        self.state().fail_quotes = on;
    }

    /// Reject the `n`th send attempt (0-based) at the node
    pub fn fail_submission_at(&self, n: usize) {
        self.state().fail_submission_at = Some(n);
    }

    pub fn drop_receipts(&self, on: bool) {
        self.state().drop_receipts = on;
    }

    /// Every quote returns `amount_out` regardless of reserves
    pub fn override_quote(&self, amount_out: U256) {
        self.state().quote_override = Some(amount_out);
    }

    pub fn revert_action(&self, kind: ActionKind, reason: &str) {
        self.state().forced_reverts.insert(kind, reason.to_string());
    }

    // ── inspection ─────────────────────────────────────────────────────

    pub fn token_balance_of(&self, token: Address, owner: Address) -> U256 {
        self.state().ledger.balance(token, owner)
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state()
            .ledger
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Amount of the last approval submitted for `token` and `spender`
    pub fn allowance_granted(&self, token: Address, spender: Address) -> Option<U256> {
        self.state()
            .submitted
            .iter()
            .rev()
            .filter(|tx| tx.kind == ActionKind::Approve && tx.to == token)
            .filter_map(|tx| IERC20::approveCall::abi_decode(&tx.input).ok())
            .find(|call| call.spender == spender)
            .map(|call| call.amount)
    }

    /// LP balance of `owner` in the WETH/`token` pool
    pub fn lp_balance(&self, token: Address, owner: Address) -> U256 {
        let state = self.state();
        match state.ledger.pools.get(&sort_tokens(WETH, token)) {
            Some(pool) => state.ledger.balance(pool.address, owner),
            None => U256::ZERO,
        }
    }

    pub fn submitted_nonces(&self) -> Vec<u64> {
        self.state().submitted.iter().map(|tx| tx.nonce).collect()
    }

    pub fn submitted_kinds(&self) -> Vec<ActionKind> {
        self.state().submitted.iter().map(|tx| tx.kind).collect()
    }

    pub fn last_input(&self, kind: ActionKind) -> Option<Bytes> {
        self.state()
            .submitted
            .iter()
            .rev()
            .find(|tx| tx.kind == kind)
            .map(|tx| tx.input.clone())
    }

    pub fn last_swap_output(&self) -> Option<U256> {
        self.state().last_swap_output
    }

    pub fn quote_calls(&self) -> usize {
        self.state().quote_calls
    }
}

fn node_down() -> ChainError {
    ChainError::Transport("connection refused".to_string())
}

#[async_trait]
impl ChainClient for MockChain {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        let state = self.state();
        if state.fail_reads {
            return Err(node_down());
        }
        Ok(state.ledger.native.get(&owner).copied().unwrap_or_default())
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64, ChainError> {
        let state = self.state();
        if state.fail_reads {
            return Err(node_down());
        }
        Ok(state.nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ChainError> {
        if self.state().fail_reads {
            return Err(node_down());
        }
        Ok(self.allowance_of(token, owner, spender))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        if self.state().fail_reads {
            return Err(node_down());
        }
        Ok(self.token_balance_of(token, owner))
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        self.state()
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::Reverted("execution reverted".to_string()))
    }

    async fn amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, ChainError> {
        let mut state = self.state();
        if state.fail_reads {
            return Err(node_down());
        }
        state.quote_calls += 1;

        let no_liquidity = || ChainError::Reverted("execution reverted: UniswapV2Library: INSUFFICIENT_LIQUIDITY".to_string());
        if state.fail_quotes || router != ROUTER {
            return Err(no_liquidity());
        }

        let mut amounts = vec![amount_in];
        for hop in path.windows(2) {
            let (_, r_in, r_out) = state.ledger.oriented(hop[0], hop[1]).ok_or_else(no_liquidity)?;
            let last = amounts[amounts.len() - 1];
            amounts.push(get_amount_out(last, r_in, r_out));
        }
        if let Some(out) = state.quote_override {
            if let Some(last) = amounts.last_mut() {
                *last = out;
            }
        }
        Ok(amounts)
    }

    async fn get_pair(&self, _factory: Address, token_a: Address, token_b: Address) -> Result<Address, ChainError> {
        let state = self.state();
        if state.fail_reads {
            return Err(node_down());
        }
        // stored under canonical order only
        Ok(state
            .ledger
            .pools
            .get(&(token_a, token_b))
            .map(|pool| pool.address)
            .unwrap_or(Address::ZERO))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        let mut state = self.state();
        let attempt = state.send_attempts;
        state.send_attempts += 1;
        if state.fail_submission_at == Some(attempt) {
            return Err(ChainError::Transport("connection reset by peer".to_string()));
        }

        let mut buf = raw;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| ChainError::Transport(format!("invalid raw transaction: {}", e)))?;

        let expected = state.nonces.get(&OWNER).copied().unwrap_or_default();
        if envelope.nonce() != expected {
            return Err(ChainError::Transport(format!(
                "nonce mismatch: got {}, expected {}",
                envelope.nonce(),
                expected
            )));
        }
        let to = envelope
            .to()
            .ok_or_else(|| ChainError::Transport("contract creation not supported".to_string()))?;
        let value = envelope.value();
        let native = state.ledger.native.get(&OWNER).copied().unwrap_or_default();
        if native < value {
            return Err(ChainError::Transport("insufficient funds for gas * price + value".to_string()));
        }
        let input = envelope.input().clone();
        let kind = classify_selector(&input)
            .ok_or_else(|| ChainError::Transport("unknown selector".to_string()))?;

        state.nonces.insert(OWNER, expected + 1);
        state.block += 1;
        let hash = *envelope.tx_hash();

        let success = match state.apply(kind, to, value, &input) {
            Ok(()) => true,
            Err(reason) => {
                state.last_revert = Some(format!("execution reverted: {}", reason));
                false
            }
        };

        state.submitted.push(SubmittedTx {
            kind,
            nonce: expected,
            to,
            input,
        });

        if !state.drop_receipts {
            let block = state.block;
            state.receipts.insert(
                hash,
                ReceiptSummary {
                    tx_hash: hash,
                    success,
                    block_number: Some(block),
                    gas_used: 21_000,
                },
            );
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError> {
        Ok(self.state().receipts.get(&tx_hash).cloned())
    }

    async fn revert_reason(&self, _call: CallRequest) -> Option<String> {
        self.state().last_revert.clone()
    }
}

/// Clock that records sleeps and advances its own time instead of waiting
pub struct ManualClock {
    now: Mutex<u64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        *self.now.lock().unwrap() += duration.as_secs();
    }
}

// ── fixtures ───────────────────────────────────────────────────────────

pub fn test_account() -> Account {
    Account::from_private_key(TEST_KEY, CHAIN_ID).unwrap()
}

/// Executor with a short confirmation timeout, polling on `clock`
pub fn fast_executor_with_clock(chain: &Arc<MockChain>, clock: Arc<ManualClock>) -> StepExecutor<MockChain> {
    StepExecutor::new(
        chain.clone(),
        test_account(),
        GasPolicy::default(),
        ExecutorSettings {
            confirmation_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            explorer_tx_url: Some("https://explorer.test/tx/".to_string()),
        },
        clock,
    )
}

pub fn fast_executor(chain: &Arc<MockChain>) -> StepExecutor<MockChain> {
    fast_executor_with_clock(chain, Arc::new(ManualClock::new(1_700_000_000)))
}

pub fn composer_settings() -> ComposerSettings {
    ComposerSettings {
        router: ROUTER,
        factory: FACTORY,
        weth: WETH,
        tolerance: Tolerance::from_f64(0.10).unwrap(),
        approval_margin: Fraction::from_f64(0.10).unwrap(),
        swap_deadline_secs: 600,
        remove_deadline_secs: 1000,
        removal_fraction: Fraction::from_f64(0.30).unwrap(),
        balanced_ceiling: U256::from(30_000_000_000_000u64),
    }
}

pub fn composer_with_clock(
    chain: &Arc<MockChain>,
    clock: Arc<ManualClock>,
) -> OperationComposer<MockChain, ManualClock> {
    OperationComposer::new(fast_executor_with_clock(chain, clock.clone()), composer_settings(), clock)
}

pub fn composer(chain: &Arc<MockChain>) -> OperationComposer<MockChain, ManualClock> {
    composer_with_clock(chain, Arc::new(ManualClock::new(1_700_000_000)))
}

/// One token, 0.00003 ETH per round, 0.001 ETH floor
pub fn round_settings(mode: OperationKind) -> RoundSettings {
    RoundSettings {
        mode,
        tokens: vec![TOKEN_A],
        amount: AmountSpec::Fixed(U256::from(30_000_000_000_000u64)),
        balance_floor: U256::from(1_000_000_000_000_000u64),
        round_delay_secs: 5..=10,
        low_balance_delay: Duration::from_secs(10),
    }
}
