use std::fmt;

use crate::error::TransferError;

pub const DEFAULT_MAX_INLINE_FILTERS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    InlineExclude,
    ExcludeFromFile,
    InlineInclude,
    IncludeFromFile,
    FilesFromFile,
    InlineChecksum,
    ChecksumFromFile,
}

impl TransferMode {
    pub const ALL: [TransferMode; 7] = [
        Self::InlineExclude,
        Self::ExcludeFromFile,
        Self::InlineInclude,
        Self::IncludeFromFile,
        Self::FilesFromFile,
        Self::InlineChecksum,
        Self::ChecksumFromFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::InlineExclude => "exclude",
            Self::ExcludeFromFile => "exclude-from",
            Self::InlineInclude => "include",
            Self::IncludeFromFile => "include-from",
            Self::FilesFromFile => "files-from",
            Self::InlineChecksum => "checksum",
            Self::ChecksumFromFile => "checksum-from",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }

    pub fn uses_list_file(self) -> bool {
        matches!(
            self,
            Self::ExcludeFromFile
                | Self::IncludeFromFile
                | Self::FilesFromFile
                | Self::ChecksumFromFile
        )
    }

    pub fn is_checksum(self) -> bool {
        matches!(self, Self::InlineChecksum | Self::ChecksumFromFile)
    }

    pub fn lists_excluded(self) -> bool {
        matches!(self, Self::InlineExclude | Self::ExcludeFromFile)
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeRequest {
    pub included: usize,
    pub excluded: usize,
    pub total: usize,
    pub explicit: Vec<TransferMode>,
    pub checksum_preferred: bool,
    pub max_inline_filters: usize,
}

pub fn select_mode(request: &ModeRequest) -> Result<TransferMode, TransferError> {
    check_decisions(request.included, request.excluded, request.total)?;

    let mut explicit = request.explicit.clone();
    explicit.dedup();
    match explicit.as_slice() {
        [] => {}
        [mode] => return Ok(*mode),
        _ => return Err(TransferError::AmbiguousMode(explicit)),
    }

    let inline_ok = |count: usize| count <= request.max_inline_filters;
    let mode = if request.checksum_preferred {
        if inline_ok(request.included) {
            TransferMode::InlineChecksum
        } else {
            TransferMode::ChecksumFromFile
        }
    } else if request.included < request.excluded {
        if inline_ok(request.included) {
            TransferMode::InlineInclude
        } else {
            TransferMode::IncludeFromFile
        }
    } else if inline_ok(request.excluded) {
        TransferMode::InlineExclude
    } else {
        TransferMode::ExcludeFromFile
    };
    Ok(mode)
}

pub fn check_decisions(included: usize, excluded: usize, total: usize) -> Result<(), TransferError> {
    let decided = included + excluded;
    if decided < total {
        return Err(TransferError::UndecidedChangesRemain {
            undecided: total - decided,
        });
    }
    if included == 0 {
        return Err(TransferError::NothingIncluded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(included: usize, excluded: usize, max: usize) -> ModeRequest {
        ModeRequest {
            included,
            excluded,
            total: included + excluded,
            explicit: Vec::new(),
            checksum_preferred: false,
            max_inline_filters: max,
        }
    }

    #[test]
    fn prefers_the_shorter_side() {
        assert_eq!(select_mode(&request(5, 20, 12)), Ok(TransferMode::InlineInclude));
        assert_eq!(select_mode(&request(20, 3, 12)), Ok(TransferMode::InlineExclude));
        assert_eq!(select_mode(&request(20, 3, 2)), Ok(TransferMode::ExcludeFromFile));
        assert_eq!(select_mode(&request(15, 20, 12)), Ok(TransferMode::IncludeFromFile));
    }

    #[test]
    fn tie_goes_to_exclude_side() {
        assert_eq!(select_mode(&request(4, 4, 12)), Ok(TransferMode::InlineExclude));
        assert_eq!(select_mode(&request(7, 0, 0)), Ok(TransferMode::InlineExclude));
    }

    #[test]
    fn checksum_preference_uses_included_count() {
        let mut req = request(3, 30, 3);
        req.checksum_preferred = true;
        assert_eq!(select_mode(&req), Ok(TransferMode::InlineChecksum));
        req.included = 4;
        req.total = 34;
        assert_eq!(select_mode(&req), Ok(TransferMode::ChecksumFromFile));
    }

    #[test]
    fn explicit_mode_wins() {
        let mut req = request(1, 100, 20);
        req.explicit = vec![TransferMode::FilesFromFile];
        assert_eq!(select_mode(&req), Ok(TransferMode::FilesFromFile));

        req.explicit = vec![TransferMode::InlineExclude, TransferMode::InlineExclude];
        assert_eq!(select_mode(&req), Ok(TransferMode::InlineExclude));

        req.explicit = vec![TransferMode::InlineExclude, TransferMode::FilesFromFile];
        assert_eq!(
            select_mode(&req),
            Err(TransferError::AmbiguousMode(vec![
                TransferMode::InlineExclude,
                TransferMode::FilesFromFile
            ]))
        );
    }

    #[test]
    fn refuses_incomplete_or_empty_decisions() {
        let mut req = request(2, 3, 20);
        req.total = 8;
        assert_eq!(
            select_mode(&req),
            Err(TransferError::UndecidedChangesRemain { undecided: 3 })
        );
        assert_eq!(select_mode(&request(0, 5, 20)), Err(TransferError::NothingIncluded));

        // precondition failures come before mode conflicts
        let mut req = request(0, 5, 20);
        req.explicit = TransferMode::ALL.to_vec();
        assert_eq!(select_mode(&req), Err(TransferError::NothingIncluded));
    }

    #[test]
    fn names_round_trip() {
        for mode in TransferMode::ALL {
            assert_eq!(TransferMode::parse(mode.name()), Some(mode));
        }
        assert_eq!(TransferMode::parse("inline"), None);
        assert!(TransferMode::ChecksumFromFile.uses_list_file());
        assert!(!TransferMode::InlineChecksum.uses_list_file());
    }
}
