use crate::blockchain::rpc_client::AccountSource;
use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::protocol::fetch_record;
use crate::protocol::marinade::types::State;
use crate::utils::pda;
use solana_sdk::pubkey::Pubkey;

pub const RESERVE_SEED: &[u8] = b"reserve";
pub const MSOL_MINT_AUTHORITY_SEED: &[u8] = b"st_mint";
pub const LIQ_SOL_LEG_SEED: &[u8] = b"liq_sol";
pub const LIQ_MSOL_LEG_AUTHORITY_SEED: &[u8] = b"liq_st_sol_authority";

// Bumps are stored in the state, so these skip the bump search.
fn state_address(
    programs: &ProgramRegistry,
    state: &State,
    seed: &[u8],
    bump: u8,
) -> Result<Pubkey> {
    pda::create_address(&[state.address.as_ref(), seed, &[bump]], &programs.marinade)
}

/// SOL reserve holding undelegated stake.
pub fn reserve_address(programs: &ProgramRegistry, state: &State) -> Result<Pubkey> {
    state_address(programs, state, RESERVE_SEED, state.reserve_bump_seed)
}

pub fn msol_mint_authority(programs: &ProgramRegistry, state: &State) -> Result<Pubkey> {
    state_address(programs, state, MSOL_MINT_AUTHORITY_SEED, state.msol_mint_authority_bump_seed)
}

/// SOL side of the liquid-unstake pool.
pub fn liq_pool_sol_leg(programs: &ProgramRegistry, state: &State) -> Result<Pubkey> {
    state_address(programs, state, LIQ_SOL_LEG_SEED, state.liq_pool.sol_leg_bump_seed)
}

pub fn liq_pool_msol_leg_authority(programs: &ProgramRegistry, state: &State) -> Result<Pubkey> {
    state_address(
        programs,
        state,
        LIQ_MSOL_LEG_AUTHORITY_SEED,
        state.liq_pool.msol_leg_authority_bump_seed,
    )
}

pub async fn fetch_state(source: &dyn AccountSource, programs: &ProgramRegistry) -> Result<State> {
    fetch_record(source, &programs.marinade, &programs.marinade_state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::MemorySource;
    use crate::core::error::Error;
    use crate::layout::AccountRecord;

    fn state_with_bumps(programs: &ProgramRegistry) -> State {
        let address = programs.marinade_state;
        let bump = |seed: &[u8]| {
            Pubkey::find_program_address(&[address.as_ref(), seed], &programs.marinade).1
        };
        let mut state = State {
            address,
            reserve_bump_seed: bump(RESERVE_SEED),
            msol_mint_authority_bump_seed: bump(MSOL_MINT_AUTHORITY_SEED),
            ..State::default()
        };
        state.liq_pool.sol_leg_bump_seed = bump(LIQ_SOL_LEG_SEED);
        state.liq_pool.msol_leg_authority_bump_seed = bump(LIQ_MSOL_LEG_AUTHORITY_SEED);
        state
    }

    #[test]
    fn test_stored_bumps_reproduce_search() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let state = state_with_bumps(&programs);
        let searched = |seed: &[u8]| {
            Pubkey::find_program_address(&[state.address.as_ref(), seed], &programs.marinade).0
        };
        assert_eq!(reserve_address(&programs, &state).unwrap(), searched(RESERVE_SEED));
        assert_eq!(
            msol_mint_authority(&programs, &state).unwrap(),
            searched(MSOL_MINT_AUTHORITY_SEED)
        );
        assert_eq!(liq_pool_sol_leg(&programs, &state).unwrap(), searched(LIQ_SOL_LEG_SEED));
        assert_eq!(
            liq_pool_msol_leg_authority(&programs, &state).unwrap(),
            searched(LIQ_MSOL_LEG_AUTHORITY_SEED)
        );
    }

    #[tokio::test]
    async fn test_fetch_state_requires_marinade_owner() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let data = State::encode_fields(&State::zeroed_fields().unwrap()).unwrap();

        let source = MemorySource::new().with_account(
            programs.marinade_state,
            programs.marinade,
            data.clone(),
        );
        assert_eq!(fetch_state(&source, &programs).await.unwrap().address, programs.marinade_state);

        let spoofed =
            MemorySource::new().with_account(programs.marinade_state, Pubkey::new_unique(), data);
        assert!(matches!(fetch_state(&spoofed, &programs).await, Err(Error::MalformedAccount(_))));
        let missing = fetch_state(&MemorySource::new(), &programs).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
