use super::*;

/// Pool → worker: one numbered unit of work.
///
/// `head_meta` is the serialized block head the worker mines on. Its layout belongs to the block
/// format, not to the framing, so it is carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMessage {
    pub work_unit: WorkUnit,
    pub head_meta: Vec<u8>,
}

impl JobMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(WorkUnit::SIZE + self.head_meta.len());
        payload.extend_from_slice(&self.work_unit.to_bytes());
        payload.extend_from_slice(&self.head_meta);
        payload
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        ensure!(
            payload.len() >= WorkUnit::SIZE,
            TruncatedSnafu {
                what: "job",
                expected: WorkUnit::SIZE,
                actual: payload.len(),
            }
        );

        let (work_unit, head_meta) = payload.split_at(WorkUnit::SIZE);

        Ok(Self {
            work_unit: WorkUnit::new(BigEndian::read_u32(work_unit)),
            head_meta: head_meta.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn layout() {
        let job = JobMessage {
            work_unit: WorkUnit::new(2),
            head_meta: vec![0xaa, 0xbb],
        };

        assert_eq!(job.encode(), [0, 0, 0, 2, 0xaa, 0xbb]);
        assert_eq!(JobMessage::decode(&job.encode()).unwrap(), job);
    }

    #[test]
    fn empty_head_meta_is_allowed() {
        let job = JobMessage::decode(&[0, 0, 0, 9]).unwrap();
        assert_eq!(job.work_unit, WorkUnit::new(9));
        assert!(job.head_meta.is_empty());
    }

    #[test]
    fn truncated() {
        assert_eq!(
            JobMessage::decode(&[0, 1]).unwrap_err().to_string(),
            "job needs 4 bytes, got 2"
        );
    }
}
