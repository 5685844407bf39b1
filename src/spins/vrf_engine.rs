use crate::common::types::RandomnessRequest;
use crate::errors::SlotResult;
use crate::machine::SlotMachine;
use crate::spins::types::{RandomWord, SpinResult};
use schnorrkel::context::SigningContext;
use schnorrkel::{Keypair, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const VRF_SIGNING_CONTEXT: &[u8] = b"reelvault-spin";

/// Random word together with the material needed to verify it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfBundle {
    pub random_word: RandomWord,
    /// Hex signature the word was derived from
    pub proof: String,
    pub public_key: String,
    pub input_message: String,
}

/// Verifiable randomness source playing the oracle's role in-process
pub struct VrfEngine {
    keypair: Arc<Keypair>,
}

impl VrfEngine {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Engine with a fresh random keypair
    pub fn new_random() -> Self {
        use rand_core::OsRng;
        Self::new(Keypair::generate_with(OsRng))
    }

    /// Input message signed for a request
    pub fn input_message(request: &RandomnessRequest) -> String {
        format!(
            "reelvault:{}:{}:{}",
            request.request_id, request.payment, request.num_words
        )
    }

    /// Sign the request; the word is the sha256 of the signature
    pub fn generate(&self, request: &RandomnessRequest) -> VrfBundle {
        let input_message = Self::input_message(request);
        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let signature = self.keypair.sign(ctx.bytes(input_message.as_bytes()));
        let signature_bytes = signature.to_bytes();

        VrfBundle {
            random_word: RandomWord::from_bytes(Sha256::digest(signature_bytes).into()),
            proof: hex::encode(signature_bytes),
            public_key: self.public_key_hex(),
            input_message,
        }
    }

    /// Check the signature and that the word was derived from it
    pub fn verify(bundle: &VrfBundle, expected_input: &str) -> bool {
        if bundle.input_message != expected_input {
            return false;
        }

        let Some(public_key) = hex::decode(&bundle.public_key)
            .ok()
            .and_then(|bytes| PublicKey::from_bytes(&bytes).ok())
        else {
            return false;
        };
        let Some(signature_bytes) = hex::decode(&bundle.proof).ok() else {
            return false;
        };
        let Ok(signature) = Signature::from_bytes(&signature_bytes) else {
            return false;
        };

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        if public_key
            .verify(ctx.bytes(expected_input.as_bytes()), &signature)
            .is_err()
        {
            return false;
        }

        let derived: [u8; 32] = Sha256::digest(&signature_bytes).into();
        derived == *bundle.random_word.as_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }
}

/// Task that drains randomness requests and delivers words to the machine
pub struct VrfFulfiller {
    engine: VrfEngine,
    machine: Arc<SlotMachine>,
    delay: Duration,
}

impl VrfFulfiller {
    pub fn new(engine: VrfEngine, machine: Arc<SlotMachine>, delay: Duration) -> Self {
        Self {
            engine,
            machine,
            delay,
        }
    }

    /// Run until every sender of the request channel is dropped
    pub async fn run(self, mut requests: mpsc::Receiver<RandomnessRequest>) {
        info!(public_key = %self.engine.public_key_hex(), "VRF fulfiller started");

        while let Some(request) = requests.recv().await {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Err(e) = self.fulfill(&request) {
                warn!(request_id = request.request_id, error = %e, "Fulfillment rejected");
            }
        }

        info!("VRF fulfiller stopped");
    }

    /// Generate and deliver the word for one request
    pub fn fulfill(&self, request: &RandomnessRequest) -> SlotResult<SpinResult> {
        let bundle = self.engine.generate(request);
        debug!(
            request_id = request.request_id,
            random_word = %bundle.random_word,
            proof = %bundle.proof,
            "Generated VRF word"
        );
        self.machine.fulfill(request.request_id, bundle.random_word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::RequestId;

    fn request(request_id: RequestId) -> RandomnessRequest {
        RandomnessRequest {
            request_id,
            payment: 20,
            num_words: 1,
        }
    }

    #[test]
    fn test_generation_and_verification() {
        let engine = VrfEngine::new_random();
        let bundle = engine.generate(&request(1));

        let expected = VrfEngine::input_message(&request(1));
        assert!(VrfEngine::verify(&bundle, &expected));
        assert!(!VrfEngine::verify(&bundle, &VrfEngine::input_message(&request(2))));
    }

    #[test]
    fn test_tampered_word_rejected() {
        let engine = VrfEngine::new_random();
        let mut bundle = engine.generate(&request(3));
        bundle.random_word = RandomWord::from(42);

        let expected = VrfEngine::input_message(&request(3));
        assert!(!VrfEngine::verify(&bundle, &expected));
    }

    #[test]
    fn test_words_differ_per_request() {
        let engine = VrfEngine::new_random();
        let first = engine.generate(&request(1)).random_word;
        let second = engine.generate(&request(2)).random_word;
        assert_ne!(first, second);
    }
}
