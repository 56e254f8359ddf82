//! Keyframe location with a bounded forward scan and explicit fallbacks

use std::path::Path;

use image::RgbImage;
use tracing::debug;

use crate::error::{MontageError, MontageResult};
use crate::ports::{DecodeSession, DecodedFrame, StreamInfo};

/// Maximum number of packets inspected after the backward seek
pub const MAX_SCAN_PACKETS: usize = 15;

/// States of the keyframe search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorState {
    /// Backward seek to the keyframe at or before the target
    SeekLanded,
    /// Bounded forward scan after the seek
    Scanning,
    /// A keyframe after the landing keyframe was found
    FoundNext,
    /// Only the landing keyframe was found
    FallbackToLanding,
    /// Nothing near the seek point, scanning from the start of the stream
    FullRescan,
    /// No keyframe anywhere
    Failed,
}

/// Keyframe chosen for a requested timestamp
#[derive(Debug, Clone)]
pub struct LocatedKeyframe {
    pub image: RgbImage,
    /// Presentation time of the keyframe in seconds
    pub timestamp: f64,
    /// State that produced the keyframe
    pub state: LocatorState,
}

struct Candidate {
    frame: DecodedFrame,
    time: f64,
}

/// Finds the keyframe to use for a requested timestamp
#[derive(Debug, Clone)]
pub struct KeyframeLocator {
    max_packets: usize,
}

impl Default for KeyframeLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeLocator {
    /// Create a locator with the default packet budget
    pub fn new() -> Self {
        Self {
            max_packets: MAX_SCAN_PACKETS,
        }
    }

    /// Override the packet budget of the forward scan
    pub fn with_max_packets(mut self, max_packets: usize) -> Self {
        self.max_packets = max_packets;
        self
    }

    /// Locate the keyframe for `timestamp` in an open session
    pub fn locate(
        &self,
        session: &mut dyn DecodeSession,
        stream: &StreamInfo,
        path: &Path,
        timestamp: f64,
    ) -> MontageResult<LocatedKeyframe> {
        let mut state = LocatorState::SeekLanded;
        let mut landing: Option<Candidate> = None;
        let mut next: Option<Candidate> = None;

        loop {
            state = match state {
                LocatorState::SeekLanded => {
                    let target_pts = stream.time_base.seconds_to_pts(timestamp);
                    session.seek(stream.index, target_pts, true)?;
                    LocatorState::Scanning
                }
                LocatorState::Scanning => {
                    self.scan(session, stream, timestamp, &mut landing, &mut next)?;
                    if next.is_some() {
                        LocatorState::FoundNext
                    } else if landing.is_some() {
                        LocatorState::FallbackToLanding
                    } else {
                        LocatorState::FullRescan
                    }
                }
                LocatorState::FoundNext => {
                    return Self::finish(next.take(), state, path, timestamp);
                }
                LocatorState::FallbackToLanding => {
                    return Self::finish(landing.take(), state, path, timestamp);
                }
                LocatorState::FullRescan => {
                    debug!(
                        "No keyframe near {:.2}s in {}, rescanning from the start",
                        timestamp,
                        path.display()
                    );
                    session.seek(stream.index, 0, false)?;
                    match Self::first_keyframe(session, stream, timestamp)? {
                        Some(candidate) => {
                            return Self::finish(Some(candidate), state, path, timestamp);
                        }
                        None => LocatorState::Failed,
                    }
                }
                LocatorState::Failed => {
                    return Err(MontageError::NoKeyframeFound {
                        path: path.to_path_buf(),
                        timestamp,
                    });
                }
            };
        }
    }

    /// Scan at most `max_packets` packets, recording the landing keyframe and
    /// the first keyframe strictly after it.
    fn scan(
        &self,
        session: &mut dyn DecodeSession,
        stream: &StreamInfo,
        requested: f64,
        landing: &mut Option<Candidate>,
        next: &mut Option<Candidate>,
    ) -> MontageResult<()> {
        for _ in 0..self.max_packets {
            let Some(packet) = session.next_packet(stream.index)? else {
                break;
            };

            for frame in packet.frames.into_iter().filter(|frame| frame.key_frame) {
                let time = Self::frame_time(&frame, stream, requested);
                match landing {
                    None => *landing = Some(Candidate { frame, time }),
                    Some(first) if time > first.time => {
                        *next = Some(Candidate { frame, time });
                        return Ok(());
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn first_keyframe(
        session: &mut dyn DecodeSession,
        stream: &StreamInfo,
        requested: f64,
    ) -> MontageResult<Option<Candidate>> {
        while let Some(packet) = session.next_packet(stream.index)? {
            if let Some(frame) = packet.frames.into_iter().find(|frame| frame.key_frame) {
                let time = Self::frame_time(&frame, stream, requested);
                return Ok(Some(Candidate { frame, time }));
            }
        }
        Ok(None)
    }

    fn frame_time(frame: &DecodedFrame, stream: &StreamInfo, requested: f64) -> f64 {
        frame
            .pts
            .map(|pts| stream.time_base.pts_to_seconds(pts))
            .unwrap_or(requested)
    }

    fn finish(
        candidate: Option<Candidate>,
        state: LocatorState,
        path: &Path,
        timestamp: f64,
    ) -> MontageResult<LocatedKeyframe> {
        let candidate = candidate.ok_or_else(|| MontageError::NoKeyframeFound {
            path: path.to_path_buf(),
            timestamp,
        })?;

        debug!(
            "Requested {:.2}s, using keyframe at {:.2}s ({:?})",
            timestamp, candidate.time, state
        );

        Ok(LocatedKeyframe {
            image: candidate.frame.pixels.to_image()?,
            timestamp: candidate.time,
            state,
        })
    }
}
