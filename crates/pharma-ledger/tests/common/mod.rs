//! Shared fixture: a chain with a bootstrapped regulator and one actor per role.

#![allow(dead_code)]

use pharma_core::{BatchId, Timestamp};
use pharma_crypto::Ed25519KeyPair;
use pharma_ledger::{
    ActionRequest, LedgerConfig, PharmaChain, ProductDescriptor, RegistryCommand, Signed,
    SubmissionReceipt,
};
use pharma_state::{Action, Role};

pub struct Fixture {
    pub chain: PharmaChain,
    pub authority: Ed25519KeyPair,
    pub regulator: Ed25519KeyPair,
    pub manufacturer: Ed25519KeyPair,
    pub distributor: Ed25519KeyPair,
    pub pharmacy: Ed25519KeyPair,
}

pub fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[seed; 32])
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let authority = key(0xa0);
        let mut fx = Self {
            chain: PharmaChain::new(authority.actor_id(), config),
            authority,
            regulator: key(0x01),
            manufacturer: key(0x02),
            distributor: key(0x03),
            pharmacy: key(0x04),
        };
        let bootstrap =
            RegistryCommand::register(fx.authority.actor_id(), fx.regulator.actor_id(), Role::Regulator);
        fx.chain
            .administer(&Signed::sign(bootstrap, &fx.authority).expect("sign bootstrap"))
            .expect("bootstrap regulator");
        for (actor, role) in [
            (fx.manufacturer.actor_id(), Role::Manufacturer),
            (fx.distributor.actor_id(), Role::Distributor),
            (fx.pharmacy.actor_id(), Role::Pharmacy),
        ] {
            fx.register_actor(actor, role);
        }
        fx
    }

    pub fn register_actor(&mut self, actor: pharma_core::ActorId, role: Role) {
        let cmd = RegistryCommand::register(self.regulator.actor_id(), actor, role);
        self.chain
            .administer(&Signed::sign(cmd, &self.regulator).expect("sign"))
            .expect("register actor");
    }

    pub fn revoke(&mut self, actor: pharma_core::ActorId) {
        let cmd = RegistryCommand::revoke(self.regulator.actor_id(), actor);
        self.chain
            .administer(&Signed::sign(cmd, &self.regulator).expect("sign"))
            .expect("revoke actor");
    }

    pub fn register_batch(&mut self) -> BatchId {
        let req = ActionRequest::register(
            self.manufacturer.actor_id(),
            product(),
            Timestamp::parse("2026-06-01T07:30:00Z").expect("timestamp"),
        );
        self.chain
            .submit(&Signed::sign(req, &self.manufacturer).expect("sign"))
            .expect("register batch")
            .batch_id
    }

    /// Sign and submit `action` as `signer` against the batch's current sequence.
    pub fn act(
        &mut self,
        signer: &Ed25519KeyPair,
        batch_id: BatchId,
        action: Action,
        recipient: Option<&Ed25519KeyPair>,
    ) -> Result<SubmissionReceipt, pharma_ledger::LedgerError> {
        let sequence = self.chain.read(batch_id)?.last_sequence;
        let mut req = ActionRequest::existing(signer.actor_id(), batch_id, sequence, action);
        if let Some(r) = recipient {
            req = req.with_recipient(r.actor_id());
        }
        self.chain.submit(&Signed::sign(req, signer)?)
    }

    /// Manufacturer ships to the distributor, who delivers to the pharmacy.
    pub fn deliver(&mut self, batch_id: BatchId) {
        let (m, d, p) = (key(0x02), key(0x03), key(0x04));
        self.act(&m, batch_id, Action::Ship, Some(&d)).expect("ship");
        self.act(&d, batch_id, Action::Receive, Some(&p)).expect("receive");
    }
}

pub fn product() -> ProductDescriptor {
    ProductDescriptor::new("Amoxicillin 500mg", "capsule", 12_000)
}
