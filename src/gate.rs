use crate::{GateMode, OracleClient, VerifyVerdict, VoiceprintStore, AUDIO_MIME};

/// Decides whether the speaker of a live sample is the enrolled owner of
/// a user id. Fail-closed: no enrollment, an oracle failure, or a
/// malformed verdict all deny.
pub(crate) struct BiometricGate {
    mode: GateMode,
    threshold: f64,
}

impl BiometricGate {
    pub(crate) fn new(mode: GateMode, threshold: f64) -> Self {
        Self { mode, threshold }
    }

    pub(crate) fn verify(
        &self,
        oracle: &OracleClient,
        profiles: &VoiceprintStore,
        user_id: &str,
        live: &[u8],
    ) -> bool {
        if self.mode == GateMode::Demo {
            return true;
        }

        let Some(enrolled) = profiles.load(user_id) else {
            eprintln!("[gate] no voiceprint enrolled for {user_id}, denying");
            return false;
        };

        match oracle.verify_speakers(&enrolled, live, AUDIO_MIME) {
            Ok(verdict) => {
                let accepted = accept_verdict(&verdict, self.threshold);
                eprintln!(
                    "[gate] user={user_id} same_speaker={} similarity={:.2} accepted={accepted}",
                    verdict.same_speaker, verdict.similarity
                );
                accepted
            }
            Err(err) => {
                eprintln!("[gate] verification failed closed for {user_id}: {err}");
                false
            }
        }
    }
}

/// Accept only when the oracle says same speaker AND similarity clears
/// the threshold.
pub(crate) fn accept_verdict(verdict: &VerifyVerdict, threshold: f64) -> bool {
    verdict.same_speaker && verdict.similarity >= threshold
}
