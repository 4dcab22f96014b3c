//! Live speech synthesis backend using espeak-ng.
//!
//! Speaks directly on the host audio device; espeak-ng has no pause
//! capability, so pause/resume report unsupported.

#![allow(non_upper_case_globals)]

use crate::event::{Event, EventBus};
use crate::player::{PlayerAction, SpeechBackend};
use espeakng_sys::*;
use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const VOICE_NAME: &str = "English";
const BUFF_LEN: i32 = 500;
const OPTIONS: i32 = 0;

// espeak-ng keeps global state, only one utterance may run at a time
static SPEAK_LOCK: Mutex<()> = Mutex::new(());

pub struct EspeakBackend {
    bus: EventBus,
    generation: Arc<AtomicU64>,
}

impl EspeakBackend {
    pub fn new(bus: EventBus) -> Self {
        EspeakBackend {
            bus,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl SpeechBackend for EspeakBackend {
    fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let marker = self.generation.clone();
        let bus = self.bus.clone();

        // Filter out null bytes to prevent CString::new from failing
        let filtered: String = text.chars().filter(|&c| c != '\0').collect();
        let text_cstr = CString::new(filtered)?;

        tokio::task::spawn_blocking(move || {
            let _guard = match SPEAK_LOCK.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            unsafe {
                let output: espeak_AUDIO_OUTPUT = espeak_AUDIO_OUTPUT_AUDIO_OUTPUT_PLAYBACK;
                espeak_Initialize(output, BUFF_LEN, std::ptr::null(), OPTIONS);

                let voice_name_cstr =
                    CString::new(VOICE_NAME).expect("static voice name contains no nulls");
                espeak_SetVoiceByName(voice_name_cstr.as_ptr() as *const c_char);

                let position = 0u32;
                let position_type: espeak_POSITION_TYPE = 0;
                let end_position = 0u32;
                let flags = espeakCHARS_AUTO;

                espeak_Synth(
                    text_cstr.as_ptr() as *const c_void,
                    BUFF_LEN as usize,
                    position,
                    position_type,
                    end_position,
                    flags,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                );
                espeak_Synchronize();
                espeak_Terminate();
            }

            // Only signal completion if this utterance was not cancelled
            if marker.load(Ordering::SeqCst) == generation {
                bus.send(Event::Player(PlayerAction::Finished));
            }
        });

        Ok(())
    }

    fn pause(&mut self) -> bool {
        false
    }

    fn resume(&mut self) -> bool {
        false
    }

    fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        unsafe {
            espeak_Cancel();
        }
    }
}
