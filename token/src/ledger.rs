use crate::TokenError;
use edu_types::{Address, TokenAmount};

/// The fungible-token operations the fund consumes.
///
/// `transfer_in` moves tokens from a payer into the fund's custody and
/// consumes the allowance the payer granted to the fund. `transfer_out`
/// moves tokens from custody to a payee. Both either complete fully or
/// fail without effect.
///
/// Implementations receive no handle to fund state, so a transfer can
/// never call back into a fund operation.
pub trait TokenLedger {
    /// Tokens currently held by `holder`.
    fn balance_of(&self, holder: &Address) -> TokenAmount;

    /// Amount `owner` has authorised the fund to pull.
    fn allowance(&self, owner: &Address) -> TokenAmount;

    fn transfer_in(&mut self, payer: &Address, amount: TokenAmount) -> Result<(), TokenError>;

    fn transfer_out(&mut self, payee: &Address, amount: TokenAmount) -> Result<(), TokenError>;
}

impl<T: TokenLedger + ?Sized> TokenLedger for Box<T> {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        (**self).balance_of(holder)
    }

    fn allowance(&self, owner: &Address) -> TokenAmount {
        (**self).allowance(owner)
    }

    fn transfer_in(&mut self, payer: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        (**self).transfer_in(payer, amount)
    }

    fn transfer_out(&mut self, payee: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        (**self).transfer_out(payee, amount)
    }
}
