#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Two experiences (5 and 3 highlights) and one technology category (4 details).
pub const RESUME: &str = r#"cv:
  name: Jane Doe
  email: jane@example.com
  sections:
    summary:
      - Backend engineer who likes boring, reliable systems.
    experience:
      - company: Acme
        position: Senior Engineer
        start_date: 2021-03
        end_date: present
        highlights:
          - Designed the billing pipeline processing 2M invoices a month
          - Mentored four engineers through their first on-call rotation
          - "Cut CI times by 40% with remote caching: Bazel + S3"
          - Led the migration from Python services to Rust
          - Organized the internal reading group
      - company: Globex
        position: Engineer
        start_date: 2018-06
        end_date: 2021-02
        highlights:
          - Built a Kafka ingestion layer
          - Wrote the team's Terraform modules
          - Maintained the customer-facing dashboard
    technologies:
      - label: Languages & Tools
        details: Rust, Python (Django, FastAPI), Kubernetes, Terraform
design:
  theme: classic
"#;

pub const JOB_POSTING: &str = "Staff Rust Engineer\n\nYou will own our Kubernetes-based \
platform. Must have: Rust, Kubernetes, Terraform. Nice to have: Kafka.\n";

/// Every list reversed.
pub const REVERSED_REPLY: &str = r#"```yaml
experience:
  - company: Globex
    position: Engineer
    highlights:
      - Maintained the customer-facing dashboard
      - Wrote the team's Terraform modules
      - Built a Kafka ingestion layer
  - company: Acme
    position: Senior Engineer
    highlights:
      - Organized the internal reading group
      - Led the migration from Python services to Rust
      - "Cut CI times by 40% with remote caching: Bazel + S3"
      - Mentored four engineers through their first on-call rotation
      - Designed the billing pipeline processing 2M invoices a month
technologies:
  - label: Languages & Tools
    details:
      - Terraform
      - Kubernetes
      - Python (Django, FastAPI)
      - Rust
```"#;

pub fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let resume = dir.join("resume.yaml");
    let job = dir.join("job.txt");
    std::fs::write(&resume, RESUME).unwrap();
    std::fs::write(&job, JOB_POSTING).unwrap();
    (resume, job)
}

/// A stand-in for `rendercv render <yaml> --pdf-path <pdf>` that writes a fake PDF.
#[cfg(unix)]
pub fn fake_renderer(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-rendercv");
    std::fs::write(
        &script,
        "#!/bin/sh\n[ \"$1\" = render ] || exit 3\n[ -f \"$2\" ] || exit 4\nprintf '%s\\n' '%PDF-1.4 fake' > \"$4\"\necho \"rendered $2\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}
