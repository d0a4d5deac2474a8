// Copyright (c) 2023 The ledger-algo Developers

//! Algorand transaction record and field schema.
//!
//! Canonical transactions are MessagePack maps with sorted keys, so the `type`
//! key typically arrives after kind-specific fields. Each kind's fields are
//! decoded into a dedicated part of the [Txn] record, with the combination
//! checked against `type` once the map is complete ([Txn::validate]).

use core::str::FromStr;

use heapless::{String, Vec};
use num_enum::TryFromPrimitive;
use sha2::{Digest, Sha512_256};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    consts::{
        MAX_APP_ACCOUNTS, MAX_APP_ARGS, MAX_APP_ARG_LEN, MAX_ASSET_NAME_LEN, MAX_ASSET_URL_LEN,
        MAX_FOREIGN, MAX_GENESIS_ID_LEN, MAX_NOTE_LEN, MAX_UNIT_NAME_LEN,
    },
    msgpack::Reader,
    stream::DecodeError,
};

/// 32-byte ed25519 public key / account address
pub type Address = [u8; 32];

/// Algorand transaction types
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumIter)]
pub enum TxnKind {
    /// Payment
    #[strum(serialize = "pay")]
    Payment,
    /// Key registration
    #[strum(serialize = "keyreg")]
    KeyReg,
    /// Asset transfer
    #[strum(serialize = "axfer")]
    AssetTransfer,
    /// Asset freeze
    #[strum(serialize = "afrz")]
    AssetFreeze,
    /// Asset configuration
    #[strum(serialize = "acfg")]
    AssetConfig,
    /// Application call
    #[strum(serialize = "appl")]
    Application,
}

/// Application call on-completion actions
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive, Display)]
#[repr(u8)]
pub enum OnCompletion {
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

// `num_enum` treats a `#[default]` variant as a catch-all for unknown values
#[allow(clippy::derivable_impls)]
impl Default for OnCompletion {
    fn default() -> Self {
        OnCompletion::NoOp
    }
}

/// Top-level transaction fields, by MessagePack key
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumIter)]
#[repr(u8)]
pub enum Field {
    #[strum(serialize = "fee")]
    Fee,
    #[strum(serialize = "fv")]
    FirstValid,
    #[strum(serialize = "lv")]
    LastValid,
    #[strum(serialize = "gen")]
    GenesisId,
    #[strum(serialize = "gh")]
    GenesisHash,
    #[strum(serialize = "grp")]
    Group,
    #[strum(serialize = "lx")]
    Lease,
    #[strum(serialize = "note")]
    Note,
    #[strum(serialize = "rekey")]
    RekeyTo,
    #[strum(serialize = "snd")]
    Sender,
    #[strum(serialize = "type")]
    Type,

    #[strum(serialize = "rcv")]
    Receiver,
    #[strum(serialize = "amt")]
    Amount,
    #[strum(serialize = "close")]
    CloseRemainderTo,

    #[strum(serialize = "votekey")]
    VoteKey,
    #[strum(serialize = "selkey")]
    SelectionKey,
    #[strum(serialize = "sprfkey")]
    StateProofKey,
    #[strum(serialize = "votefst")]
    VoteFirst,
    #[strum(serialize = "votelst")]
    VoteLast,
    #[strum(serialize = "votekd")]
    VoteKeyDilution,
    #[strum(serialize = "nonpart")]
    NonParticipation,

    #[strum(serialize = "xaid")]
    XferAsset,
    #[strum(serialize = "aamt")]
    AssetAmount,
    #[strum(serialize = "asnd")]
    AssetSender,
    #[strum(serialize = "arcv")]
    AssetReceiver,
    #[strum(serialize = "aclose")]
    AssetCloseTo,

    #[strum(serialize = "faid")]
    FreezeAsset,
    #[strum(serialize = "fadd")]
    FreezeAccount,
    #[strum(serialize = "afrz")]
    AssetFrozen,

    #[strum(serialize = "caid")]
    ConfigAsset,
    #[strum(serialize = "apar")]
    AssetParams,

    #[strum(serialize = "apid")]
    ApplicationId,
    #[strum(serialize = "apan")]
    OnCompletion,
    #[strum(serialize = "apat")]
    Accounts,
    #[strum(serialize = "apaa")]
    ApplicationArgs,
    #[strum(serialize = "apfa")]
    ForeignApps,
    #[strum(serialize = "apas")]
    ForeignAssets,
    #[strum(serialize = "apap")]
    ApprovalProgram,
    #[strum(serialize = "apsu")]
    ClearStateProgram,
    #[strum(serialize = "apgs")]
    GlobalStateSchema,
    #[strum(serialize = "apls")]
    LocalStateSchema,
    #[strum(serialize = "apep")]
    ExtraPages,
}

impl Field {
    /// Bit for this field in a seen-field mask
    pub const fn mask(&self) -> u64 {
        1u64 << (*self as u8)
    }

    /// Transaction kind this field belongs to, `None` for common header fields
    pub const fn kind(&self) -> Option<TxnKind> {
        use Field::*;

        let k = match self {
            Fee | FirstValid | LastValid | GenesisId | GenesisHash | Group | Lease | Note
            | RekeyTo | Sender | Type => return None,
            Receiver | Amount | CloseRemainderTo => TxnKind::Payment,
            VoteKey | SelectionKey | StateProofKey | VoteFirst | VoteLast | VoteKeyDilution
            | NonParticipation => TxnKind::KeyReg,
            XferAsset | AssetAmount | AssetSender | AssetReceiver | AssetCloseTo => {
                TxnKind::AssetTransfer
            }
            FreezeAsset | FreezeAccount | AssetFrozen => TxnKind::AssetFreeze,
            ConfigAsset | AssetParams => TxnKind::AssetConfig,
            ApplicationId | OnCompletion | Accounts | ApplicationArgs | ForeignApps
            | ForeignAssets | ApprovalProgram | ClearStateProgram | GlobalStateSchema
            | LocalStateSchema | ExtraPages => TxnKind::Application,
        };

        Some(k)
    }
}

/// Payment fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Payment {
    pub receiver: Address,
    pub amount: u64,
    pub close_to: Option<Address>,
}

/// Key registration fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct KeyReg {
    pub vote_key: Option<[u8; 32]>,
    pub selection_key: Option<[u8; 32]>,
    pub state_proof_key: Option<[u8; 64]>,
    pub vote_first: u64,
    pub vote_last: u64,
    pub key_dilution: u64,
    pub non_participation: bool,
}

/// Asset transfer fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AssetTransfer {
    pub asset_id: u64,
    pub amount: u64,
    /// Clawback source
    pub sender: Option<Address>,
    pub receiver: Address,
    pub close_to: Option<Address>,
}

/// Asset freeze fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AssetFreeze {
    pub asset_id: u64,
    pub account: Address,
    pub frozen: bool,
}

/// Asset configuration fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AssetConfig {
    /// Asset to reconfigure, zero when creating
    pub asset_id: u64,
    pub params: AssetParams,
}

/// Asset parameter map keys
#[derive(Copy, Clone, PartialEq, Debug, EnumString)]
#[repr(u8)]
enum ParamField {
    #[strum(serialize = "t")]
    Total,
    #[strum(serialize = "dc")]
    Decimals,
    #[strum(serialize = "df")]
    DefaultFrozen,
    #[strum(serialize = "un")]
    UnitName,
    #[strum(serialize = "an")]
    AssetName,
    #[strum(serialize = "au")]
    Url,
    #[strum(serialize = "am")]
    MetadataHash,
    #[strum(serialize = "m")]
    Manager,
    #[strum(serialize = "r")]
    Reserve,
    #[strum(serialize = "f")]
    Freeze,
    #[strum(serialize = "c")]
    Clawback,
}

/// Asset parameters (`apar`)
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u64,
    pub default_frozen: bool,
    pub unit_name: String<MAX_UNIT_NAME_LEN>,
    pub asset_name: String<MAX_ASSET_NAME_LEN>,
    pub url: String<MAX_ASSET_URL_LEN>,
    pub metadata_hash: Option<[u8; 32]>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

impl AssetParams {
    /// Decode an asset parameter map
    fn decode(r: &mut Reader) -> Result<Self, DecodeError> {
        let mut p = Self::default();
        let mut seen = 0u16;

        for _ in 0..r.read_map_len()? {
            let f = ParamField::from_str(r.read_str()?).map_err(|_| DecodeError::UnknownField)?;
            let m = 1u16 << (f as u8);
            if seen & m != 0 {
                return Err(DecodeError::DuplicateField);
            }
            seen |= m;

            match f {
                ParamField::Total => p.total = r.read_u64()?,
                ParamField::Decimals => p.decimals = r.read_u64()?,
                ParamField::DefaultFrozen => p.default_frozen = r.read_bool()?,
                ParamField::UnitName => p.unit_name = string(r)?,
                ParamField::AssetName => p.asset_name = string(r)?,
                ParamField::Url => p.url = string(r)?,
                ParamField::MetadataHash => p.metadata_hash = Some(r.read_bin_array()?),
                ParamField::Manager => p.manager = Some(r.read_bin_array()?),
                ParamField::Reserve => p.reserve = Some(r.read_bin_array()?),
                ParamField::Freeze => p.freeze = Some(r.read_bin_array()?),
                ParamField::Clawback => p.clawback = Some(r.read_bin_array()?),
            }
        }

        Ok(p)
    }
}

/// Application state schema (`apgs` / `apls`)
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct StateSchema {
    pub num_uint: u64,
    pub num_byte_slice: u64,
}

impl StateSchema {
    /// Decode a state schema map
    fn decode(r: &mut Reader) -> Result<Self, DecodeError> {
        let mut s = Self::default();
        let (mut uint, mut bytes) = (false, false);

        for _ in 0..r.read_map_len()? {
            let (v, seen) = match r.read_str()? {
                "nui" => (&mut s.num_uint, &mut uint),
                "nbs" => (&mut s.num_byte_slice, &mut bytes),
                _ => return Err(DecodeError::UnknownField),
            };
            if *seen {
                return Err(DecodeError::DuplicateField);
            }
            *seen = true;
            *v = r.read_u64()?;
        }

        Ok(s)
    }
}

/// Application call fields
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ApplicationCall {
    pub app_id: u64,
    pub on_completion: OnCompletion,
    pub accounts: Vec<Address, MAX_APP_ACCOUNTS>,
    pub args: Vec<Vec<u8, MAX_APP_ARG_LEN>, MAX_APP_ARGS>,
    pub foreign_apps: Vec<u64, MAX_FOREIGN>,
    pub foreign_assets: Vec<u64, MAX_FOREIGN>,
    /// SHA-512/256 digest of the approval program
    pub approval_program: Option<[u8; 32]>,
    /// SHA-512/256 digest of the clear state program
    pub clear_program: Option<[u8; 32]>,
    pub global_schema: Option<StateSchema>,
    pub local_schema: Option<StateSchema>,
    pub extra_pages: u64,
}

/// Decoded transaction record
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Txn {
    pub kind: Option<TxnKind>,
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String<MAX_GENESIS_ID_LEN>,
    pub genesis_hash: [u8; 32],
    pub group: Option<[u8; 32]>,
    pub lease: Option<[u8; 32]>,
    pub note: Vec<u8, MAX_NOTE_LEN>,
    pub rekey_to: Option<Address>,

    pub payment: Payment,
    pub keyreg: KeyReg,
    pub asset_xfer: AssetTransfer,
    pub asset_freeze: AssetFreeze,
    pub asset_config: AssetConfig,
    pub application: ApplicationCall,
}

impl Txn {
    /// Clear all transaction fields
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Decode the value for `field` from a reader positioned at a complete value
    pub fn apply(&mut self, field: Field, r: &mut Reader) -> Result<(), DecodeError> {
        use Field::*;

        match field {
            Fee => self.fee = r.read_u64()?,
            FirstValid => self.first_valid = r.read_u64()?,
            LastValid => self.last_valid = r.read_u64()?,
            GenesisId => self.genesis_id = string(r)?,
            GenesisHash => self.genesis_hash = r.read_bin_array()?,
            Group => self.group = Some(r.read_bin_array()?),
            Lease => self.lease = Some(r.read_bin_array()?),
            Note => self.note = bytes(r)?,
            RekeyTo => self.rekey_to = Some(r.read_bin_array()?),
            Sender => self.sender = r.read_bin_array()?,
            Type => {
                let k = TxnKind::from_str(r.read_str()?)
                    .map_err(|_| DecodeError::UnknownTxnType)?;
                self.kind = Some(k);
            }

            Receiver => self.payment.receiver = r.read_bin_array()?,
            Amount => self.payment.amount = r.read_u64()?,
            CloseRemainderTo => self.payment.close_to = Some(r.read_bin_array()?),

            VoteKey => self.keyreg.vote_key = Some(r.read_bin_array()?),
            SelectionKey => self.keyreg.selection_key = Some(r.read_bin_array()?),
            StateProofKey => self.keyreg.state_proof_key = Some(r.read_bin_array()?),
            VoteFirst => self.keyreg.vote_first = r.read_u64()?,
            VoteLast => self.keyreg.vote_last = r.read_u64()?,
            VoteKeyDilution => self.keyreg.key_dilution = r.read_u64()?,
            NonParticipation => self.keyreg.non_participation = r.read_bool()?,

            XferAsset => self.asset_xfer.asset_id = r.read_u64()?,
            AssetAmount => self.asset_xfer.amount = r.read_u64()?,
            AssetSender => self.asset_xfer.sender = Some(r.read_bin_array()?),
            AssetReceiver => self.asset_xfer.receiver = r.read_bin_array()?,
            AssetCloseTo => self.asset_xfer.close_to = Some(r.read_bin_array()?),

            FreezeAsset => self.asset_freeze.asset_id = r.read_u64()?,
            FreezeAccount => self.asset_freeze.account = r.read_bin_array()?,
            AssetFrozen => self.asset_freeze.frozen = r.read_bool()?,

            ConfigAsset => self.asset_config.asset_id = r.read_u64()?,
            AssetParams => self.asset_config.params = self::AssetParams::decode(r)?,

            ApplicationId => self.application.app_id = r.read_u64()?,
            OnCompletion => {
                let v = u8::try_from(r.read_u64()?).map_err(|_| DecodeError::InvalidEnum)?;
                self.application.on_completion =
                    self::OnCompletion::try_from(v).map_err(|_| DecodeError::InvalidEnum)?;
            }
            Accounts => {
                let mut a = Vec::new();
                for _ in 0..r.read_array_len()? {
                    a.push(r.read_bin_array()?)
                        .map_err(|_| DecodeError::FieldTooLong)?;
                }
                self.application.accounts = a;
            }
            ApplicationArgs => {
                let mut a = Vec::new();
                for _ in 0..r.read_array_len()? {
                    a.push(bytes(r)?).map_err(|_| DecodeError::FieldTooLong)?;
                }
                self.application.args = a;
            }
            ForeignApps => self.application.foreign_apps = u64s(r)?,
            ForeignAssets => self.application.foreign_assets = u64s(r)?,
            ApprovalProgram => {
                self.application.approval_program = Some(program_digest(r.read_bin()?))
            }
            ClearStateProgram => {
                self.application.clear_program = Some(program_digest(r.read_bin()?))
            }
            GlobalStateSchema => self.application.global_schema = Some(StateSchema::decode(r)?),
            LocalStateSchema => self.application.local_schema = Some(StateSchema::decode(r)?),
            ExtraPages => self.application.extra_pages = r.read_u64()?,
        }

        Ok(())
    }

    /// Validate a completed record against the set of decoded fields
    pub fn validate(&self, seen: u64) -> Result<(), DecodeError> {
        let kind = match self.kind {
            Some(k) if seen & Field::Sender.mask() != 0 => k,
            _ => return Err(DecodeError::MissingField),
        };

        // Every kind-specific field must match the declared type
        for f in Field::iter().filter(|f| seen & f.mask() != 0) {
            match f.kind() {
                Some(k) if k != kind => return Err(DecodeError::FieldTypeMismatch),
                _ => (),
            }
        }

        Ok(())
    }
}

/// Read a string bounded by its record slot
fn string<const N: usize>(r: &mut Reader) -> Result<String<N>, DecodeError> {
    let mut s = String::new();
    s.push_str(r.read_str()?)
        .map_err(|_| DecodeError::FieldTooLong)?;
    Ok(s)
}

/// Read a byte array bounded by its record slot
fn bytes<const N: usize>(r: &mut Reader) -> Result<Vec<u8, N>, DecodeError> {
    Vec::from_slice(r.read_bin()?).map_err(|_| DecodeError::FieldTooLong)
}

/// Read an array of unsigned integers
fn u64s<const N: usize>(r: &mut Reader) -> Result<Vec<u64, N>, DecodeError> {
    let mut v = Vec::new();
    for _ in 0..r.read_array_len()? {
        v.push(r.read_u64()?)
            .map_err(|_| DecodeError::FieldTooLong)?;
    }
    Ok(v)
}

/// Programs are too large to retain, so only their digest is kept for display
fn program_digest(p: &[u8]) -> [u8; 32] {
    let mut d = [0u8; 32];
    d.copy_from_slice(Sha512_256::new().chain_update(p).finalize().as_ref());
    d
}
